//! Trait definitions for the executor module.

use async_trait::async_trait;

use super::types::{ExecutionRequest, ExecutionResult};

/// Runs one child process to completion or timeout.
///
/// Implementations never return an error: a missing binary, a non-zero exit
/// and a timeout are all reported through [`ExecutionResult`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes the request and returns exactly one result.
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;
}
