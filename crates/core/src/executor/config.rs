//! Configuration for the subprocess executor.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout policy applied to every child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Timeout used when a caller does not pick one, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Ceiling for caller-supplied timeouts, in seconds.
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    super::DEFAULT_TIMEOUT_SECS
}

fn default_max_timeout_secs() -> u64 {
    300
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            max_timeout_secs: default_max_timeout_secs(),
        }
    }
}

impl ExecutorConfig {
    /// Sets the timeout ceiling.
    pub fn with_max_timeout(mut self, max_timeout_secs: u64) -> Self {
        self.max_timeout_secs = max_timeout_secs;
        self
    }

    /// Clamps a requested timeout into `1s..=max_timeout_secs`. A zero
    /// request means "no preference" and gets the default timeout.
    pub fn effective_timeout(&self, requested: Duration) -> Duration {
        let requested = if requested.is_zero() {
            Duration::from_secs(self.default_timeout_secs)
        } else {
            requested
        };
        let ceiling = Duration::from_secs(self.max_timeout_secs.max(1));
        requested.clamp(Duration::from_secs(1), ceiling)
    }
}
