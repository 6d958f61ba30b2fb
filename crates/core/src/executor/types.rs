//! Request and result types for subprocess execution.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout applied when a request does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Exit code reported when the child could not be started at all.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// A single child process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Binary to run. Either an absolute path or a name looked up on `PATH`.
    pub program: PathBuf,
    /// Argument vector, passed to the child verbatim.
    pub args: Vec<OsString>,
    /// Wall-clock limit for the whole run.
    pub timeout: Duration,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

impl ExecutionRequest {
    /// Creates a request with the default timeout.
    pub fn new<I, A>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Adds an environment override.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Short name of the binary (file stem), used for logs and metric labels.
    pub fn binary_name(&self) -> String {
        binary_name(&self.program)
    }

    /// Returns true when the argument vector is exactly `[arg]`.
    pub fn has_single_arg(&self, arg: &str) -> bool {
        self.args.len() == 1 && self.args[0] == arg
    }
}

pub(crate) fn binary_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

/// Outcome of one child process run.
///
/// This is the only channel through which success or failure is reported.
/// A timeout shows up as `success: false` with the exit code of the kill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True iff the exit code is 0.
    pub success: bool,
    /// Exit code, or [`SPAWN_FAILED_EXIT_CODE`] if the process never started.
    pub exit_code: i32,
    /// Captured standard output, trimmed.
    pub stdout: String,
    /// Captured standard error, trimmed.
    pub stderr: String,
}

impl ExecutionResult {
    /// Builds a result from an exit code and raw captured output.
    pub fn from_output(exit_code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
            stdout: String::from_utf8_lossy(stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Result for a child that could not be started.
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: SPAWN_FAILED_EXIT_CODE,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }

    /// Successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout and stderr joined by a newline.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
            (false, true) => self.stdout.clone(),
            _ => self.stderr.clone(),
        }
    }
}
