//! Error types for the capability module.

use thiserror::Error;

/// Programmer errors raised by the resolver.
///
/// A missing or broken binary is never an error; it is reported as an
/// unavailable [`CapabilityRecord`](super::CapabilityRecord).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The requested encoder is not in the registry.
    #[error("Unknown encoder: {name}")]
    UnknownEncoder { name: String },

    /// The registry itself is inconsistent.
    #[error("Malformed encoder registry: {reason}")]
    MalformedRegistry { reason: String },
}

impl CapabilityError {
    /// Creates a new unknown encoder error.
    pub fn unknown_encoder(name: impl Into<String>) -> Self {
        Self::UnknownEncoder { name: name.into() }
    }

    /// Creates a new malformed registry error.
    pub fn malformed_registry(reason: impl Into<String>) -> Self {
        Self::MalformedRegistry {
            reason: reason.into(),
        }
    }
}
