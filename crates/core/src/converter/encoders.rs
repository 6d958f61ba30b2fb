//! Command-line dialects of the supported encoders.
//!
//! Each builder returns an argument vector. Paths are passed as separate
//! arguments and never concatenated into a shell string.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use super::settings::{
    clamp_to, quality_to_quantizer, AvifSettings, GifSettings, JpegSettings, PngSettings,
    WebpSettings,
};
use crate::capability::{AVIFENC, CAVIF, CONVERT, CWEBP, GIFSICLE, JPEGOPTIM, MAGICK, OPTIPNG};

/// cavif rejects speed 0.
const CAVIF_SPEED_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// AVIF candidates, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvifEncoder {
    /// rav1e-based encoder; fastest.
    Cavif,
    /// libavif reference encoder; takes a quantizer instead of a quality.
    Avifenc,
    /// General-purpose fallback.
    ImageMagick,
}

impl AvifEncoder {
    pub const ALL: [AvifEncoder; 3] = [
        AvifEncoder::Cavif,
        AvifEncoder::Avifenc,
        AvifEncoder::ImageMagick,
    ];

    /// Registry binaries that can serve this candidate, preferred first.
    pub fn binaries(&self) -> &'static [&'static str] {
        match self {
            AvifEncoder::Cavif => &[CAVIF],
            AvifEncoder::Avifenc => &[AVIFENC],
            AvifEncoder::ImageMagick => &[MAGICK, CONVERT],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvifEncoder::Cavif => "cavif",
            AvifEncoder::Avifenc => "avifenc",
            AvifEncoder::ImageMagick => "imagemagick",
        }
    }

    /// Arguments for converting `input` into `output`.
    pub fn args(&self, input: &Path, output: &Path, settings: &AvifSettings) -> Vec<OsString> {
        match self {
            AvifEncoder::Cavif => cavif_args(input, output, settings),
            AvifEncoder::Avifenc => avifenc_args(input, output, settings),
            AvifEncoder::ImageMagick => imagemagick_avif_args(input, output, settings),
        }
    }
}

impl fmt::Display for AvifEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// cwebp tuning presets, passed through as `-preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebpPreset {
    #[default]
    Default,
    Photo,
    Picture,
    Drawing,
    Icon,
    Text,
}

impl WebpPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebpPreset::Default => "default",
            WebpPreset::Photo => "photo",
            WebpPreset::Picture => "picture",
            WebpPreset::Drawing => "drawing",
            WebpPreset::Icon => "icon",
            WebpPreset::Text => "text",
        }
    }
}

impl fmt::Display for WebpPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary used for WebP encoding.
pub const WEBP_ENCODER: &str = CWEBP;
/// Binary used for JPEG optimization.
pub const JPEG_OPTIMIZER: &str = JPEGOPTIM;
/// Binary used for PNG optimization.
pub const PNG_OPTIMIZER: &str = OPTIPNG;
/// Binary used for GIF optimization.
pub const GIF_OPTIMIZER: &str = GIFSICLE;

/// cwebp applies `-preset` before the other flags, so it has to come first.
pub fn cwebp_args(input: &Path, output: &Path, settings: &WebpSettings) -> Vec<OsString> {
    vec![
        "-preset".into(),
        settings.preset.as_str().into(),
        "-q".into(),
        settings.quality.to_string().into(),
        "-m".into(),
        settings.method.to_string().into(),
        input.into(),
        "-o".into(),
        output.into(),
    ]
}

pub fn cavif_args(input: &Path, output: &Path, settings: &AvifSettings) -> Vec<OsString> {
    let speed = clamp_to(i64::from(settings.speed), &CAVIF_SPEED_RANGE);
    vec![
        "--quality".into(),
        settings.quality.to_string().into(),
        "--speed".into(),
        speed.to_string().into(),
        "--overwrite".into(),
        "--output".into(),
        output.into(),
        input.into(),
    ]
}

pub fn avifenc_args(input: &Path, output: &Path, settings: &AvifSettings) -> Vec<OsString> {
    let quantizer = quality_to_quantizer(i64::from(settings.quality)).to_string();
    vec![
        "--min".into(),
        quantizer.clone().into(),
        "--max".into(),
        quantizer.into(),
        "--speed".into(),
        settings.speed.to_string().into(),
        "--jobs".into(),
        "1".into(),
        input.into(),
        output.into(),
    ]
}

pub fn imagemagick_avif_args(
    input: &Path,
    output: &Path,
    settings: &AvifSettings,
) -> Vec<OsString> {
    vec![
        input.into(),
        "-quality".into(),
        settings.quality.to_string().into(),
        "-define".into(),
        "heic:speed=2".into(),
        output.into(),
    ]
}

pub fn jpegoptim_args(file: &Path, settings: &JpegSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![format!("--max={}", settings.quality).into()];
    if settings.progressive {
        args.push("--all-progressive".into());
    }
    if settings.strip_metadata {
        args.push("--strip-all".into());
    }
    args.push(file.into());
    args
}

pub fn optipng_args(file: &Path, settings: &PngSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![format!("-o{}", settings.level).into()];
    if settings.strip_metadata {
        args.push("-strip".into());
        args.push("all".into());
    }
    args.push(file.into());
    args
}

pub fn gifsicle_args(file: &Path, settings: &GifSettings) -> Vec<OsString> {
    vec![
        format!("-O{}", settings.level).into(),
        "--batch".into(),
        file.into(),
    ]
}
