//! Merging caller options with configured defaults.
//!
//! Each operation resolves its settings exactly once per call. Every numeric
//! value is clamped here, so nothing out of range can reach a command line.

use std::ops::RangeInclusive;

use super::config::{AvifTuning, ConverterConfig};
use super::encoders::WebpPreset;
use super::types::{ConversionOptions, ImageDimensions};

pub const QUALITY_RANGE: RangeInclusive<i64> = 1..=100;
pub const WEBP_METHOD_RANGE: RangeInclusive<i64> = 0..=6;
pub const AVIF_SPEED_RANGE: RangeInclusive<i64> = 0..=10;
pub const AVIF_EFFORT_RANGE: RangeInclusive<i64> = 0..=9;
pub const PNG_LEVEL_RANGE: RangeInclusive<i64> = 0..=7;
pub const GIF_LEVEL_RANGE: RangeInclusive<i64> = 1..=3;

/// Clamps `value` into `range` and narrows it to `u8`.
pub fn clamp_to(value: i64, range: &RangeInclusive<i64>) -> u8 {
    value.clamp(*range.start(), *range.end()) as u8
}

pub fn clamp_quality(quality: i64) -> u8 {
    clamp_to(quality, &QUALITY_RANGE)
}

/// Maps quality (0-100, higher is better) to an AV1 quantizer (0-63, lower is better).
pub fn quality_to_quantizer(quality: i64) -> u8 {
    let quality = quality.clamp(0, 100) as f64;
    ((100.0 - quality) * 63.0 / 100.0).round() as u8
}

/// WebP encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebpSettings {
    pub quality: u8,
    pub method: u8,
    pub preset: WebpPreset,
}

impl WebpSettings {
    pub fn resolve(options: &ConversionOptions, config: &ConverterConfig) -> Self {
        Self {
            quality: clamp_quality(options.quality.unwrap_or(i64::from(config.webp_quality))),
            method: clamp_to(
                options
                    .method
                    .or(options.effort)
                    .unwrap_or(i64::from(config.webp_method)),
                &WEBP_METHOD_RANGE,
            ),
            preset: options.preset.unwrap_or(config.webp_preset),
        }
    }
}

/// AVIF encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvifSettings {
    pub quality: u8,
    pub speed: u8,
    pub effort: u8,
}

impl AvifSettings {
    /// Configured defaults, optionally tuned for the source size, then
    /// overridden field by field by whatever the caller pinned.
    pub fn resolve(
        options: &ConversionOptions,
        config: &ConverterConfig,
        dimensions: Option<ImageDimensions>,
    ) -> Self {
        let mut base = Self {
            quality: clamp_quality(i64::from(config.avif_quality)),
            speed: clamp_to(i64::from(config.avif_speed), &AVIF_SPEED_RANGE),
            effort: clamp_to(i64::from(config.avif_effort), &AVIF_EFFORT_RANGE),
        };
        if config.avif_auto_tune {
            if let Some(dimensions) = dimensions {
                base = base.tuned_for(dimensions.pixels(), &config.avif_tuning);
            }
        }

        Self {
            quality: options.quality.map(clamp_quality).unwrap_or(base.quality),
            speed: options
                .speed
                .map(|s| clamp_to(s, &AVIF_SPEED_RANGE))
                .unwrap_or(base.speed),
            effort: options
                .effort
                .map(|e| clamp_to(e, &AVIF_EFFORT_RANGE))
                .unwrap_or(base.effort),
        }
    }

    /// Larger images trade effort for speed; tiny ones get more quality.
    pub fn tuned_for(self, pixels: u64, tuning: &AvifTuning) -> Self {
        let mut tuned = self;
        if pixels > tuning.large_pixels {
            tuned.speed = 8;
            tuned.effort = 2;
        } else if pixels > tuning.medium_pixels {
            tuned.speed = 7;
            tuned.effort = 3;
        }
        if pixels < tuning.small_pixels {
            tuned.quality = (tuned.quality + 10).min(90);
            tuned.speed = 4;
            tuned.effort = 6;
        }
        tuned
    }
}

/// JPEG optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSettings {
    pub quality: u8,
    pub progressive: bool,
    pub strip_metadata: bool,
}

impl JpegSettings {
    pub fn resolve(options: &ConversionOptions, config: &ConverterConfig) -> Self {
        Self {
            quality: clamp_quality(options.quality.unwrap_or(i64::from(config.jpeg_quality))),
            progressive: options.progressive.unwrap_or(config.progressive_jpeg),
            strip_metadata: options.strip_metadata.unwrap_or(config.strip_metadata),
        }
    }
}

/// PNG optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngSettings {
    pub level: u8,
    pub strip_metadata: bool,
}

impl PngSettings {
    pub fn resolve(options: &ConversionOptions, config: &ConverterConfig) -> Self {
        Self {
            level: clamp_to(
                options
                    .compression_level
                    .unwrap_or(i64::from(config.png_level)),
                &PNG_LEVEL_RANGE,
            ),
            strip_metadata: options.strip_metadata.unwrap_or(config.strip_metadata),
        }
    }
}

/// GIF optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifSettings {
    pub level: u8,
}

impl GifSettings {
    pub fn resolve(options: &ConversionOptions, config: &ConverterConfig) -> Self {
        Self {
            level: clamp_to(
                options
                    .optimization_level
                    .unwrap_or(i64::from(config.gif_level)),
                &GIF_LEVEL_RANGE,
            ),
        }
    }
}

/// Resize bounds. `None` means unbounded on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSettings {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl ResizeSettings {
    pub fn resolve(options: &ConversionOptions, config: &ConverterConfig) -> Self {
        let bound = |value: u32| (value > 0).then_some(value);
        Self {
            max_width: bound(options.max_width.unwrap_or(config.max_width)),
            max_height: bound(options.max_height.unwrap_or(config.max_height)),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_width.is_none() && self.max_height.is_none()
    }

    /// Whether the image exceeds either bound.
    pub fn needs_resize(&self, dimensions: ImageDimensions) -> bool {
        self.max_width.is_some_and(|w| dimensions.width > w)
            || self.max_height.is_some_and(|h| dimensions.height > h)
    }

    /// Target size keeping the aspect ratio, never upscaling.
    pub fn target_dimensions(&self, dimensions: ImageDimensions) -> ImageDimensions {
        let ratio_for = |bound: Option<u32>, actual: u32| {
            bound.map_or(f64::INFINITY, |b| f64::from(b) / f64::from(actual.max(1)))
        };
        let ratio = ratio_for(self.max_width, dimensions.width)
            .min(ratio_for(self.max_height, dimensions.height));

        if ratio >= 1.0 {
            return dimensions;
        }
        let scale = |value: u32| ((f64::from(value) * ratio).round() as u32).max(1);
        ImageDimensions::new(scale(dimensions.width), scale(dimensions.height))
    }
}
