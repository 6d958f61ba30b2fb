//! Subprocess execution for encoder binaries.
//!
//! Every external tool the service touches is run through an [`Executor`].
//! Arguments always travel as an argument vector, stdin is closed, stdout and
//! stderr are drained concurrently and a wall-clock timeout kills the child.
//!
//! # Example
//!
//! ```ignore
//! use pixpress_core::executor::{ExecutionRequest, Executor, ExecutorConfig, ProcessExecutor};
//!
//! let executor = ProcessExecutor::new(ExecutorConfig::default());
//! let result = executor
//!     .execute(ExecutionRequest::new("cwebp", ["-version"]).with_timeout_secs(5))
//!     .await;
//! if result.success {
//!     println!("cwebp {}", result.stdout);
//! }
//! ```

mod config;
mod process;
mod traits;
mod types;

pub use config::ExecutorConfig;
pub use process::ProcessExecutor;
pub use traits::Executor;
pub use types::{ExecutionRequest, ExecutionResult, DEFAULT_TIMEOUT_SECS, SPAWN_FAILED_EXIT_CODE};
