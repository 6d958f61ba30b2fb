//! Configuration for the converter module.

use serde::{Deserialize, Serialize};

use super::encoders::{AvifEncoder, WebpPreset};

/// Defaults merged into every conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// WebP quality (1-100).
    #[serde(default = "default_webp_quality")]
    pub webp_quality: u8,

    /// WebP compression method (0-6, higher is slower and smaller).
    #[serde(default = "default_webp_method")]
    pub webp_method: u8,

    /// cwebp preset.
    #[serde(default)]
    pub webp_preset: WebpPreset,

    /// AVIF quality (1-100).
    #[serde(default = "default_avif_quality")]
    pub avif_quality: u8,

    /// AVIF encoder speed (0-10, higher is faster).
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,

    /// AVIF effort (0-9).
    #[serde(default = "default_avif_effort")]
    pub avif_effort: u8,

    /// Maximum JPEG quality passed to the optimizer (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// PNG optimization level (0-7).
    #[serde(default = "default_png_level")]
    pub png_level: u8,

    /// GIF optimization level (1-3).
    #[serde(default = "default_gif_level")]
    pub gif_level: u8,

    /// Emit progressive JPEGs.
    #[serde(default = "default_true")]
    pub progressive_jpeg: bool,

    /// Strip metadata when optimizing.
    #[serde(default = "default_true")]
    pub strip_metadata: bool,

    /// Resize bound in pixels, 0 for unbounded.
    #[serde(default)]
    pub max_width: u32,

    /// Resize bound in pixels, 0 for unbounded.
    #[serde(default)]
    pub max_height: u32,

    /// Derive AVIF speed/effort/quality from the source pixel count.
    #[serde(default = "default_true")]
    pub avif_auto_tune: bool,

    /// AVIF candidates in priority order.
    #[serde(default = "default_avif_encoders")]
    pub avif_encoders: Vec<AvifEncoder>,

    /// Timeout for WebP and the optimizers, in seconds.
    #[serde(default = "default_encoder_timeout")]
    pub encoder_timeout_secs: u64,

    #[serde(default)]
    pub avif_timeouts: AvifTimeouts,

    #[serde(default)]
    pub avif_tuning: AvifTuning,
}

fn default_webp_quality() -> u8 {
    80
}

fn default_webp_method() -> u8 {
    4
}

fn default_avif_quality() -> u8 {
    80
}

fn default_avif_speed() -> u8 {
    6
}

fn default_avif_effort() -> u8 {
    4
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_png_level() -> u8 {
    2
}

fn default_gif_level() -> u8 {
    3
}

fn default_true() -> bool {
    true
}

fn default_avif_encoders() -> Vec<AvifEncoder> {
    AvifEncoder::ALL.to_vec()
}

fn default_encoder_timeout() -> u64 {
    30
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            webp_quality: default_webp_quality(),
            webp_method: default_webp_method(),
            webp_preset: WebpPreset::Default,
            avif_quality: default_avif_quality(),
            avif_speed: default_avif_speed(),
            avif_effort: default_avif_effort(),
            jpeg_quality: default_jpeg_quality(),
            png_level: default_png_level(),
            gif_level: default_gif_level(),
            progressive_jpeg: true,
            strip_metadata: true,
            max_width: 0,
            max_height: 0,
            avif_auto_tune: true,
            avif_encoders: default_avif_encoders(),
            encoder_timeout_secs: default_encoder_timeout(),
            avif_timeouts: AvifTimeouts::default(),
            avif_tuning: AvifTuning::default(),
        }
    }
}

impl ConverterConfig {
    /// Sets the AVIF candidate order.
    pub fn with_avif_encoders(mut self, encoders: Vec<AvifEncoder>) -> Self {
        self.avif_encoders = encoders;
        self
    }

    /// Sets the resize bounds.
    pub fn with_max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Enables or disables AVIF auto-tuning.
    pub fn with_avif_auto_tune(mut self, enabled: bool) -> Self {
        self.avif_auto_tune = enabled;
        self
    }

    /// Timeout for one AVIF candidate, in seconds.
    pub fn avif_timeout_secs(&self, encoder: AvifEncoder) -> u64 {
        match encoder {
            AvifEncoder::Cavif => self.avif_timeouts.cavif_secs,
            AvifEncoder::Avifenc => self.avif_timeouts.avifenc_secs,
            AvifEncoder::ImageMagick => self.avif_timeouts.imagemagick_secs,
        }
    }
}

/// Per-candidate AVIF timeouts in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvifTimeouts {
    #[serde(default = "default_cavif_timeout")]
    pub cavif_secs: u64,
    #[serde(default = "default_avifenc_timeout")]
    pub avifenc_secs: u64,
    #[serde(default = "default_imagemagick_timeout")]
    pub imagemagick_secs: u64,
}

fn default_cavif_timeout() -> u64 {
    60
}

fn default_avifenc_timeout() -> u64 {
    120
}

fn default_imagemagick_timeout() -> u64 {
    90
}

impl Default for AvifTimeouts {
    fn default() -> Self {
        Self {
            cavif_secs: default_cavif_timeout(),
            avifenc_secs: default_avifenc_timeout(),
            imagemagick_secs: default_imagemagick_timeout(),
        }
    }
}

/// Pixel-count thresholds for AVIF auto-tuning.
///
/// These are tuning constants, not correctness requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvifTuning {
    /// Above this, favour speed strongly.
    #[serde(default = "default_large_pixels")]
    pub large_pixels: u64,
    /// Above this, favour speed.
    #[serde(default = "default_medium_pixels")]
    pub medium_pixels: u64,
    /// Below this, favour quality.
    #[serde(default = "default_small_pixels")]
    pub small_pixels: u64,
}

fn default_large_pixels() -> u64 {
    2_000_000
}

fn default_medium_pixels() -> u64 {
    500_000
}

fn default_small_pixels() -> u64 {
    100_000
}

impl Default for AvifTuning {
    fn default() -> Self {
        Self {
            large_pixels: default_large_pixels(),
            medium_pixels: default_medium_pixels(),
            small_pixels: default_small_pixels(),
        }
    }
}
