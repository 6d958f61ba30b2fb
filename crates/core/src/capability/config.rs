//! Configuration for the capability resolver.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where bundled binaries live and how long probe results stay fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Root of the bundled binary tree.
    #[serde(default = "default_bin_root")]
    pub bin_root: PathBuf,

    /// Capability cache lifetime in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Timeout for each probe invocation in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_bin_root() -> PathBuf {
    PathBuf::from("bin")
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_probe_timeout() -> u64 {
    10
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bin_root: default_bin_root(),
            cache_ttl_secs: default_cache_ttl(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ResolverConfig {
    /// Creates a config rooted at the given directory.
    pub fn with_bin_root(bin_root: impl Into<PathBuf>) -> Self {
        Self {
            bin_root: bin_root.into(),
            ..Default::default()
        }
    }

    /// Sets the cache TTL in seconds.
    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.bin_root, PathBuf::from("bin"));
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.probe_timeout_secs, 10);
    }

    #[test]
    fn test_builder() {
        let config = ResolverConfig::with_bin_root("/opt/pixpress/bin").with_cache_ttl(5);
        assert_eq!(config.bin_root, PathBuf::from("/opt/pixpress/bin"));
        assert_eq!(config.cache_ttl_secs, 5);
    }
}
