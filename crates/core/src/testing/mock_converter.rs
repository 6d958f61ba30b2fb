//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    compression_ratio, ConversionOptions, ConversionResult, Converter, ConverterError,
    ImageDimensions, ImageInfo, ImageKind, Operation,
};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    pub path: PathBuf,
    pub operation: Operation,
    pub options: ConversionOptions,
}

/// Mock implementation of the Converter trait.
///
/// Every conversion "halves" the input: the reported output is half the
/// original size and nothing is written to disk. Paths registered with
/// [`MockConverter::fail_path`] fail every operation, and operations
/// registered with [`MockConverter::fail_operation`] fail on every path.
///
/// # Example
///
/// ```rust,ignore
/// use pixpress_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_path("/uploads/broken.png").await;
///
/// let result = converter.convert(path, Operation::Webp, &options).await;
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    failing: Arc<RwLock<HashSet<PathBuf>>>,
    failing_operations: Arc<RwLock<HashSet<Operation>>>,
    delay_ms: Arc<RwLock<u64>>,
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `path` fail.
    pub async fn fail_path(&self, path: impl AsRef<Path>) {
        self.failing
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Make `operation` fail on every path.
    pub async fn fail_operation(&self, operation: Operation) {
        self.failing_operations.write().await.insert(operation);
    }

    /// Simulated duration of each conversion.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn inspect(&self, path: &Path) -> Result<ImageInfo, ConverterError> {
        let kind = ImageKind::from_path(path)
            .ok_or_else(|| ConverterError::invalid_input(path, "unsupported image type"))?;
        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|_| ConverterError::invalid_input(path, "file does not exist"))?
            .len();

        Ok(ImageInfo {
            path: path.to_path_buf(),
            kind,
            size_bytes,
            dimensions: ImageDimensions::new(640, 480),
        })
    }

    async fn convert(
        &self,
        path: &Path,
        operation: Operation,
        options: &ConversionOptions,
    ) -> ConversionResult {
        self.conversions.write().await.push(RecordedConversion {
            path: path.to_path_buf(),
            operation,
            options: options.clone(),
        });

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let inspected = if self.failing.read().await.contains(path)
            || self.failing_operations.read().await.contains(&operation)
        {
            Err(ConverterError::subprocess_failed("mock", 1, "simulated failure"))
        } else {
            self.inspect(path).await
        };

        match inspected {
            Ok(info) => {
                let file_size = info.size_bytes / 2;
                let output = match (&options.output_path, operation.target_extension()) {
                    (Some(path), _) => path.clone(),
                    (None, Some(ext)) => path.with_extension(ext),
                    (None, None) => path.to_path_buf(),
                };
                ConversionResult {
                    operation,
                    success: true,
                    input_path: info.path,
                    output_path: Some(output),
                    original_size: info.size_bytes,
                    file_size,
                    compression_ratio: compression_ratio(info.size_bytes, file_size),
                    encoder: Some("mock".to_string()),
                    skipped: false,
                    error_kind: None,
                    errors: Vec::new(),
                }
            }
            Err(e) => ConversionResult {
                operation,
                success: false,
                input_path: path.to_path_buf(),
                output_path: None,
                original_size: 0,
                file_size: 0,
                compression_ratio: 0.0,
                encoder: None,
                skipped: false,
                error_kind: Some(e.kind().to_string()),
                errors: e.messages(),
            },
        }
    }
}
