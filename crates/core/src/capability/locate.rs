//! Filesystem lookup of encoder binaries.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::types::PlatformKey;

/// Finds encoder binaries in the bundled tree, then on `PATH`.
#[derive(Debug, Clone)]
pub struct BinaryLocator {
    bin_root: PathBuf,
    platform: PlatformKey,
    search_path: Option<OsString>,
}

impl BinaryLocator {
    /// Creates a locator that falls back to the process `PATH`.
    pub fn new(bin_root: impl Into<PathBuf>, platform: PlatformKey) -> Self {
        Self {
            bin_root: bin_root.into(),
            platform,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Replaces the `PATH` value searched last. `None` disables the fallback.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn bin_root(&self) -> &Path {
        &self.bin_root
    }

    pub fn platform(&self) -> PlatformKey {
        self.platform
    }

    /// Bundled directories searched for a binary, most specific first.
    pub fn bundled_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.bin_root.join(self.platform.to_string()),
            self.bin_root.join(self.platform.os.as_str()),
            self.bin_root.clone(),
        ]
    }

    /// Bundled path of `name` in each of [`Self::bundled_dirs`].
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file_name = self.platform.binary_file_name(name);
        self.bundled_dirs()
            .into_iter()
            .map(|dir| dir.join(&file_name))
            .collect()
    }

    /// First executable `name` in the bundled tree, then on the search path.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let file_name = self.platform.binary_file_name(name);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        self.bundled_dirs()
            .into_iter()
            .map(PathBuf::into_os_string)
            .chain(self.search_path.clone())
            .find_map(|dirs| which::which_in(&file_name, Some(dirs), &cwd).ok())
    }
}
