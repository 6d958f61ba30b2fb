//! Converter module for turning source images into WebP/AVIF and optimizing
//! JPEG, PNG and GIF files.
//!
//! Pixels are never encoded in-process: every format operation shells out to
//! an external encoder picked through the [`CapabilityResolver`]. Resizing is
//! the exception and goes through an [`ImageEditor`].
//!
//! # Features
//!
//! - WebP via `cwebp`
//! - AVIF via `cavif`, then `avifenc`, then ImageMagick, first success wins
//! - In-place optimization with `jpegoptim`, `optipng` and `gifsicle`
//! - Downscaling to configured bounds
//! - AVIF settings auto-tuned from the source pixel count
//!
//! # Example
//!
//! ```ignore
//! use pixpress_core::converter::{ConversionOptions, Converter, FormatConverter, Operation};
//!
//! let result = converter
//!     .convert(Path::new("/uploads/photo.jpg"), Operation::Webp, &ConversionOptions::new().with_quality(80))
//!     .await;
//! if result.success {
//!     println!("saved {}%", result.compression_ratio);
//! }
//! ```
//!
//! [`CapabilityResolver`]: crate::capability::CapabilityResolver

mod config;
mod editor;
mod encoders;
mod error;
mod files;
mod format;
mod settings;
mod traits;
mod types;

pub use config::{AvifTimeouts, AvifTuning, ConverterConfig};
pub use editor::{ImageEditor, RasterEditor};
pub use encoders::{
    avifenc_args, cavif_args, cwebp_args, gifsicle_args, imagemagick_avif_args, jpegoptim_args,
    optipng_args, AvifEncoder, WebpPreset, GIF_OPTIMIZER, JPEG_OPTIMIZER, PNG_OPTIMIZER, WEBP_ENCODER,
};
pub use error::ConverterError;
pub use files::{
    compression_ratio, estimate_avif_size, format_file_size, generate_optimized_filename,
    is_same_file, validate_avif_file,
};
pub use format::FormatConverter;
pub use settings::{
    clamp_quality, clamp_to, quality_to_quantizer, AvifSettings, GifSettings, JpegSettings,
    PngSettings, ResizeSettings, WebpSettings,
};
pub use traits::Converter;
pub use types::{
    AvifEstimate, ConversionOptions, ConversionResult, ImageDimensions, ImageInfo, ImageKind, Operation,
};
