//! Types for batch processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::converter::{ConversionOptions, ConversionResult, Operation};

/// One operation to run on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: Operation,
    #[serde(flatten)]
    pub options: ConversionOptions,
}

impl OperationRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            options: ConversionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }
}

/// An image and the operations to run on it, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJob {
    pub path: PathBuf,
    #[serde(default)]
    pub operations: Vec<OperationRequest>,
}

impl ImageJob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            operations: Vec::new(),
        }
    }

    /// Appends an operation with default options.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(OperationRequest::new(operation));
        self
    }

    /// Appends an operation with explicit options.
    pub fn with_request(mut self, request: OperationRequest) -> Self {
        self.operations.push(request);
        self
    }
}

/// Everything that happened to one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub path: PathBuf,
    /// Source size in bytes, 0 if it could not be read.
    pub original_size: u64,
    /// True iff validation passed and at least one operation succeeded.
    pub success: bool,
    /// One result per operation that ran, in request order.
    pub results: Vec<ConversionResult>,
    /// Bytes saved across successful operations.
    pub total_savings: i64,
    /// Validation and operation errors.
    pub errors: Vec<String>,
    /// Copy of the source taken before an in-place rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl ImageReport {
    /// A report for an image that never got past validation.
    pub fn failed(path: impl Into<PathBuf>, original_size: u64, errors: Vec<String>) -> Self {
        Self {
            path: path.into(),
            original_size,
            success: false,
            results: Vec::new(),
            total_savings: 0,
            errors,
            backup_path: None,
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: Uuid,
    /// Reports in job order.
    pub reports: Vec<ImageReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Bytes saved across the whole batch.
    pub fn total_savings(&self) -> i64 {
        self.reports.iter().map(|r| r.total_savings).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_request_flattens_options() {
        let request: OperationRequest =
            serde_json::from_str(r#"{"operation": "avif", "quality": 60, "speed": 9}"#).unwrap();
        assert_eq!(request.operation, Operation::Avif);
        assert_eq!(request.options.quality, Some(60));
        assert_eq!(request.options.speed, Some(9));
        assert_eq!(request.options.effort, None);
    }

    #[test]
    fn test_image_job_operations_default_to_empty() {
        let job: ImageJob = serde_json::from_str(r#"{"path": "/uploads/a.png"}"#).unwrap();
        assert!(job.operations.is_empty());

        let job = ImageJob::new("/uploads/a.png")
            .with_operation(Operation::Optimize)
            .with_operation(Operation::Webp);
        assert_eq!(job.operations.len(), 2);
        assert_eq!(job.operations[1].operation, Operation::Webp);
    }
}
