//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionOptions, ConversionResult, ImageInfo, Operation};

/// Turns "process this file with operation X" into a result report.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Validates a source file without running any encoder.
    async fn inspect(&self, path: &Path) -> Result<ImageInfo, ConverterError>;

    /// Runs one operation. Failures are reported inside the result, never
    /// as a panic or error, so callers can keep going with other files.
    async fn convert(
        &self,
        path: &Path,
        operation: Operation,
        options: &ConversionOptions,
    ) -> ConversionResult;

    /// Returns the supported input formats.
    fn supported_input_formats(&self) -> &[&str] {
        &["jpg", "jpeg", "png", "gif"]
    }
}
