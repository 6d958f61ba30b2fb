//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::encoders::WebpPreset;

/// What to do with a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Encode a WebP next to the source.
    Webp,
    /// Encode an AVIF next to the source, trying candidates in order.
    Avif,
    /// Optimize in the source's own format (JPEG, PNG or GIF).
    Optimize,
    /// Downscale to the configured bounds.
    Resize,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Webp => "webp",
            Operation::Avif => "avif",
            Operation::Optimize => "optimize",
            Operation::Resize => "resize",
        }
    }

    /// Extension of the file this operation produces, if it changes format.
    pub fn target_extension(&self) -> Option<&'static str> {
        match self {
            Operation::Webp => Some("webp"),
            Operation::Avif => Some("avif"),
            Operation::Optimize | Operation::Resize => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source formats accepted for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Detects the kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A validated source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub size_bytes: u64,
    pub dimensions: ImageDimensions,
}

/// Caller-supplied tunables. Every field is optional and unclamped; the
/// converter merges them with configured defaults and clamps once per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Quality 1-100.
    pub quality: Option<i64>,
    /// AVIF speed.
    pub speed: Option<i64>,
    /// AVIF effort.
    pub effort: Option<i64>,
    /// WebP method.
    pub method: Option<i64>,
    /// WebP preset.
    pub preset: Option<WebpPreset>,
    /// PNG optimization level.
    pub compression_level: Option<i64>,
    /// GIF optimization level.
    pub optimization_level: Option<i64>,
    pub progressive: Option<bool>,
    pub strip_metadata: Option<bool>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Explicit output path. Derived from the input when absent.
    pub output_path: Option<PathBuf>,
    /// Per-call encoder timeout override in seconds.
    pub timeout_secs: Option<u64>,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_effort(mut self, effort: i64) -> Self {
        self.effort = Some(effort);
        self
    }

    pub fn with_preset(mut self, preset: WebpPreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = Some(max_width);
        self.max_height = Some(max_height);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Predicted AVIF output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvifEstimate {
    pub original_size: u64,
    pub estimated_size: u64,
    /// Quality the estimate was looked up at.
    pub quality: u8,
}

/// Outcome of one operation on one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub operation: Operation,
    pub success: bool,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    /// Source size in bytes.
    pub original_size: u64,
    /// Output size in bytes, 0 on failure.
    pub file_size: u64,
    /// Percentage saved, two decimals.
    pub compression_ratio: f64,
    /// Encoder that produced the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<String>,
    /// True when the operation had nothing to do (e.g. already within bounds).
    #[serde(default)]
    pub skipped: bool,
    /// Machine-readable error kind on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Human-readable errors, empty iff `success`.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ConversionResult {
    /// Bytes saved, negative when the output grew.
    pub fn bytes_saved(&self) -> i64 {
        if self.success {
            self.original_size as i64 - self.file_size as i64
        } else {
            0
        }
    }
}
