//! Executor backed by `tokio::process`.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Duration};
use tracing::{debug, warn};

use super::config::ExecutorConfig;
use super::traits::Executor;
use super::types::{ExecutionRequest, ExecutionResult, SPAWN_FAILED_EXIT_CODE};
use crate::metrics;

/// How long to keep draining pipes after the child is gone.
///
/// A grandchild that inherited the pipes can hold them open past the kill.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8192;

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    WaitFailed(std::io::Error),
}

/// Runs binaries as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    config: ExecutorConfig,
}

impl ProcessExecutor {
    /// Creates a new executor with the given timeout policy.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the executor's configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let binary = request.binary_name();
        let limit = self.config.effective_timeout(request.timeout);
        let started = Instant::now();

        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &request.env {
            command.env(key, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    binary = %binary,
                    program = %request.program.display(),
                    error = %e,
                    "Failed to start binary"
                );
                metrics::record_execution(&binary, "spawn_failed", started.elapsed());
                return ExecutionResult::spawn_failed(format!(
                    "Failed to start {}: {}",
                    request.program.display(),
                    e
                ));
            }
        };

        // Both pipes are drained by their own task so a chatty stderr can never
        // fill its buffer while we are blocked on stdout.
        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(tokio::spawn(drain(stdout, Arc::clone(&stdout_buf))));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(tokio::spawn(drain(stderr, Arc::clone(&stderr_buf))));
        }

        let outcome = match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => WaitOutcome::Exited(status),
            Ok(Err(e)) => WaitOutcome::WaitFailed(e),
            Err(_) => WaitOutcome::TimedOut,
        };

        let exit_code = match &outcome {
            WaitOutcome::Exited(status) => exit_code_of(status),
            WaitOutcome::WaitFailed(_) => SPAWN_FAILED_EXIT_CODE,
            WaitOutcome::TimedOut => {
                if let Err(e) = child.kill().await {
                    warn!(binary = %binary, error = %e, "Failed to kill timed out process");
                }
                match child.wait().await {
                    Ok(status) => exit_code_of(&status),
                    Err(_) => SPAWN_FAILED_EXIT_CODE,
                }
            }
        };

        let deadline = tokio::time::Instant::now() + DRAIN_GRACE;
        for mut handle in drains {
            if timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
            }
        }

        let stdout = stdout_buf.lock().await;
        let stderr = stderr_buf.lock().await;
        let mut result = ExecutionResult::from_output(exit_code, &stdout, &stderr);
        let elapsed = started.elapsed();

        let label = match outcome {
            WaitOutcome::Exited(_) => {
                if result.success {
                    "success"
                } else {
                    "failure"
                }
            }
            WaitOutcome::TimedOut => {
                force_failure(
                    &mut result,
                    format!("Process timed out after {}s and was killed", limit.as_secs()),
                );
                warn!(
                    binary = %binary,
                    timeout_secs = limit.as_secs(),
                    exit_code = result.exit_code,
                    "Binary execution timed out"
                );
                "timeout"
            }
            WaitOutcome::WaitFailed(e) => {
                force_failure(&mut result, format!("Failed to wait for process: {}", e));
                warn!(binary = %binary, error = %e, "Failed to wait for binary");
                "failure"
            }
        };

        debug!(
            binary = %binary,
            command = ?request.args,
            exit_code = result.exit_code,
            duration_ms = elapsed.as_millis() as u64,
            "Binary execution"
        );
        metrics::record_execution(&binary, label, elapsed);

        result
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
        }
    }
}

fn force_failure(result: &mut ExecutionResult, note: String) {
    result.success = false;
    if result.exit_code == 0 {
        result.exit_code = SPAWN_FAILED_EXIT_CODE;
    }
    if result.stderr.is_empty() {
        result.stderr = note;
    } else {
        result.stderr = format!("{}\n{}", result.stderr, note);
    }
}

/// Exit code of a finished child. Signals map to `128 + signal` on Unix.
fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    SPAWN_FAILED_EXIT_CODE
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn executor() -> ProcessExecutor {
        ProcessExecutor::new(ExecutorConfig::default())
    }

    fn sh(script: &str) -> ExecutionRequest {
        ExecutionRequest::new("sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_captures_exit_code_and_both_streams() {
        let result = executor()
            .execute(sh("echo hello; echo oops >&2; exit 3"))
            .await;
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.stderr, "oops");
    }

    #[tokio::test]
    async fn test_success_on_zero_exit() {
        let result = executor().execute(sh("echo done")).await;
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "done");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_minus_one() {
        let result = executor()
            .execute(ExecutionRequest::new(
                "/nonexistent/pixpress-no-such-binary",
                ["--help"],
            ))
            .await;
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(result.stderr.contains("Failed to start"));
    }

    #[tokio::test]
    async fn test_timeout_kills_long_running_child() {
        let started = Instant::now();
        let result = executor()
            .execute(ExecutionRequest::new("sleep", ["10"]).with_timeout_secs(1))
            .await;
        let elapsed = started.elapsed();

        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
        assert!(
            elapsed < Duration::from_secs(4),
            "execute blocked for {:?}",
            elapsed
        );
        assert!(result.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let result = executor()
            .execute(sh("echo started; exec sleep 10").with_timeout_secs(1))
            .await;
        assert!(!result.success);
        assert_eq!(result.stdout, "started");
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_deadlock() {
        // ~200KB on stderr before anything is written to stdout.
        let script = "i=0; while [ $i -lt 2000 ]; do printf '%0100d\\n' 0 >&2; i=$((i+1)); done; echo finished";
        let result = executor()
            .execute(sh(script).with_timeout_secs(20))
            .await;
        assert!(result.success, "stderr tail: {:?}", result.stderr.get(..64));
        assert_eq!(result.stdout, "finished");
        assert!(result.stderr.len() > 64 * 1024);
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let result = executor()
            .execute(ExecutionRequest::new("cat", Vec::<String>::new()).with_timeout_secs(5))
            .await;
        assert!(result.success);
        assert_eq!(result.stdout, "");
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let result = executor()
            .execute(ExecutionRequest::new(
                "printf",
                ["%s|", "with space", "$HOME;rm -rf x", "`id`"],
            ))
            .await;
        assert!(result.success);
        assert_eq!(result.stdout, "with space|$HOME;rm -rf x|`id`|");
    }

    #[tokio::test]
    async fn test_working_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let expected: PathBuf = dir.path().canonicalize().unwrap();

        let result = executor()
            .execute(
                sh("pwd -P; echo \"$PIXPRESS_TEST_VALUE\"")
                    .with_working_dir(dir.path())
                    .with_env("PIXPRESS_TEST_VALUE", "quality=80"),
            )
            .await;
        assert!(result.success);
        let lines: Vec<&str> = result.stdout.lines().collect();
        assert_eq!(PathBuf::from(lines[0]), expected);
        assert_eq!(lines[1], "quality=80");
    }

    #[tokio::test]
    async fn test_request_timeout_is_capped_by_config() {
        let executor = ProcessExecutor::new(ExecutorConfig::default().with_max_timeout(1));
        let started = Instant::now();
        let result = executor
            .execute(ExecutionRequest::new("sleep", ["10"]).with_timeout_secs(600))
            .await;
        assert!(!result.success);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
