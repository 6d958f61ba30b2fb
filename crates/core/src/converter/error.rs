//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during a conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The encoder needed for this operation is not available.
    #[error("Encoder not available: {encoder}")]
    EncoderUnavailable { encoder: String },

    /// Source file is missing, unreadable or not a supported image.
    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// Options cannot be applied (e.g. no resize bounds).
    #[error("Invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// The encoder ran and reported failure.
    #[error("{encoder} failed with exit code {exit_code}: {stderr}")]
    SubprocessFailed {
        encoder: String,
        exit_code: i32,
        stderr: String,
    },

    /// Every AVIF candidate failed or none was available.
    #[error("No suitable AVIF encoder found")]
    NoCandidateSucceeded { attempts: Vec<String> },

    /// The image collaborator could not resize the file.
    #[error("Resize failed: {reason}")]
    ResizeFailed { reason: String },

    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConverterError {
    /// Creates a new encoder unavailable error.
    pub fn encoder_unavailable(encoder: impl Into<String>) -> Self {
        Self::EncoderUnavailable {
            encoder: encoder.into(),
        }
    }

    /// Creates a new invalid input error.
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new invalid options error.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// Creates a new subprocess failed error.
    pub fn subprocess_failed(
        encoder: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::SubprocessFailed {
            encoder: encoder.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new resize failed error.
    pub fn resize_failed(reason: impl Into<String>) -> Self {
        Self::ResizeFailed {
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EncoderUnavailable { .. } => "encoder_unavailable",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidOptions { .. } => "invalid_options",
            Self::SubprocessFailed { .. } => "subprocess_failed",
            Self::NoCandidateSucceeded { .. } => "no_candidate_succeeded",
            Self::ResizeFailed { .. } => "resize_failed",
            Self::Io { .. } => "io",
        }
    }

    /// Human-readable messages: this error, then each failed attempt.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        if let Self::NoCandidateSucceeded { attempts } = self {
            messages.extend(attempts.iter().cloned());
        }
        messages
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SubprocessFailed { .. } | Self::Io { .. })
    }
}
