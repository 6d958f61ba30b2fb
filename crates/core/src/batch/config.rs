//! Configuration for the batch module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Limits for batch runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum images processed at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Copy the source aside before an operation rewrites it in place.
    #[serde(default)]
    pub backup_original: bool,

    /// Root of the backup tree. Copies land in `<backup_dir>/<year>/<month>/`.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

fn default_max_parallel() -> usize {
    4
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            backup_original: false,
            backup_dir: default_backup_dir(),
        }
    }
}

impl BatchConfig {
    /// Sets the parallelism bound.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Enables backups under `dir`.
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_original = true;
        self.backup_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.max_parallel, 4);
        assert!(!config.backup_original);
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
    }

    #[test]
    fn test_deserialize_empty() {
        let config: BatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_parallel, 4);
        assert!(!config.backup_original);
    }

    #[test]
    fn test_deserialize_backup() {
        let config: BatchConfig = toml::from_str(
            r#"
backup_original = true
backup_dir = "/var/backups/images"
"#,
        )
        .unwrap();
        assert!(config.backup_original);
        assert_eq!(config.backup_dir, PathBuf::from("/var/backups/images"));
    }
}
