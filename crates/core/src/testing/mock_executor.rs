//! Mock executor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures::is_probe;
use crate::executor::{ExecutionRequest, ExecutionResult, Executor};

type Handler = Arc<dyn Fn(&ExecutionRequest) -> ExecutionResult + Send + Sync>;

/// Mock implementation of the Executor trait.
///
/// Answers are keyed by binary name (the file stem of the requested program),
/// so a stub installed at `bin/linux-x64/cwebp` is answered by the `cwebp`
/// handler. Binaries without a handler behave as if they could not be spawned.
///
/// # Example
///
/// ```rust,ignore
/// use pixpress_core::testing::MockExecutor;
///
/// let executor = MockExecutor::new();
/// executor.succeed("cwebp", "1.3.2").await;
/// executor.fail("cavif", 1, "unsupported input").await;
///
/// // ...run the code under test...
///
/// assert_eq!(executor.calls_for("cwebp").await.len(), 2);
/// ```
#[derive(Default)]
pub struct MockExecutor {
    handlers: RwLock<HashMap<String, Handler>>,
    calls: RwLock<Vec<ExecutionRequest>>,
}

impl fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockExecutor").finish_non_exhaustive()
    }
}

impl MockExecutor {
    /// Create a new mock executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request for `binary` with `handler`.
    pub async fn on<F>(&self, binary: &str, handler: F)
    where
        F: Fn(&ExecutionRequest) -> ExecutionResult + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .await
            .insert(binary.to_string(), Arc::new(handler));
    }

    /// Answer probe requests for `binary` with a healthy version string and
    /// everything else with `handler`.
    pub async fn on_encoder<F>(&self, binary: &str, handler: F)
    where
        F: Fn(&ExecutionRequest) -> ExecutionResult + Send + Sync + 'static,
    {
        let version = format!("{} version 1.0.0", binary);
        self.on(binary, move |request| {
            if is_probe(request) {
                ExecutionResult::ok(version.clone())
            } else {
                handler(request)
            }
        })
        .await;
    }

    /// Always succeed with the given stdout.
    pub async fn succeed(&self, binary: &str, stdout: &str) {
        let stdout = stdout.to_string();
        self.on(binary, move |_| ExecutionResult::ok(stdout.clone()))
            .await;
    }

    /// Always fail with the given exit code and stderr.
    pub async fn fail(&self, binary: &str, exit_code: i32, stderr: &str) {
        let stderr = stderr.to_string();
        self.on(binary, move |_| ExecutionResult::failed(exit_code, stderr.clone()))
            .await;
    }

    /// Every request received, in order.
    pub async fn calls(&self) -> Vec<ExecutionRequest> {
        self.calls.read().await.clone()
    }

    /// Requests received for one binary.
    pub async fn calls_for(&self, binary: &str) -> Vec<ExecutionRequest> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|request| request.binary_name() == binary)
            .cloned()
            .collect()
    }

    /// Requests that were not capability probes.
    pub async fn encoder_calls(&self) -> Vec<ExecutionRequest> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|request| !is_probe(request))
            .cloned()
            .collect()
    }

    /// Number of requests received.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Forget recorded requests.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let binary = request.binary_name();
        let handler = self.handlers.read().await.get(&binary).cloned();
        self.calls.write().await.push(request.clone());

        match handler {
            Some(handler) => handler(&request),
            None => ExecutionResult::spawn_failed(format!(
                "{}: No such file or directory",
                request.program.display()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_binary_fails_to_spawn() {
        let executor = MockExecutor::new();
        let result = executor
            .execute(ExecutionRequest::new("/opt/bin/cwebp", ["-h"]))
            .await;
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert_eq!(executor.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_on_encoder_answers_probes() {
        let executor = MockExecutor::new();
        executor
            .on_encoder("cwebp", |_| ExecutionResult::failed(2, "bad input"))
            .await;

        let probe = executor
            .execute(ExecutionRequest::new("/opt/bin/cwebp", ["-version"]))
            .await;
        assert!(probe.success);
        assert_eq!(probe.stdout, "cwebp version 1.0.0");

        let encode = executor
            .execute(ExecutionRequest::new("/opt/bin/cwebp", ["-q", "80", "a.png"]))
            .await;
        assert_eq!(encode.exit_code, 2);

        assert_eq!(executor.encoder_calls().await.len(), 1);
        assert_eq!(executor.calls_for("cwebp").await.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_calls() {
        let executor = MockExecutor::new();
        executor.succeed("gifsicle", "").await;
        executor
            .execute(ExecutionRequest::new("gifsicle", ["--help"]))
            .await;
        executor.clear_calls().await;
        assert_eq!(executor.call_count().await, 0);
    }
}
