//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the subprocess and pixel layers so converter,
//! resolver and batch logic can be exercised without real encoders installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use pixpress_core::testing::{fixtures, MockExecutor, MockImageEditor};
//!
//! let executor = Arc::new(MockExecutor::new());
//! executor
//!     .on_encoder("cwebp", |request| {
//!         fixtures::write_output(fixtures::last_arg(request), 1024)
//!     })
//!     .await;
//!
//! let resolver = fixtures::resolver_for(bin_root.path(), executor.clone());
//! ```

mod mock_converter;
mod mock_executor;
mod mock_image_editor;

pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_executor::MockExecutor;
pub use mock_image_editor::{MockImageEditor, RecordedResize};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::ffi::OsStr;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use crate::capability::{
        find_encoder, BinaryLocator, CacheStore, CapabilityResolver, MemoryCache, PlatformKey,
        ResolverConfig,
    };
    use crate::executor::{ExecutionRequest, ExecutionResult, Executor};

    /// Header of a minimal AVIF file (`ftyp` box with the `avif` brand).
    pub const AVIF_HEADER: &[u8] = b"\x00\x00\x00\x1cftypavif\x00\x00\x00\x00";

    /// Install an empty executable named `name` directly under `dir`.
    pub fn install_stub_binary(dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(PlatformKey::detect().binary_file_name(name));
        std::fs::write(&path, b"#!/bin/sh\nexit 0\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }

    /// Write a file of `size` bytes and return its path.
    pub fn write_file(dir: &Path, name: &str, size: usize) -> io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, vec![0xA5u8; size])?;
        Ok(path)
    }

    /// Bytes of a fake AVIF file with a valid header, padded to `size`.
    pub fn avif_bytes(size: usize) -> Vec<u8> {
        let mut bytes = AVIF_HEADER.to_vec();
        bytes.resize(size.max(AVIF_HEADER.len()), 0);
        bytes
    }

    /// Simulate an encoder writing `size` bytes to `path`.
    pub fn write_output(path: impl AsRef<Path>, size: usize) -> ExecutionResult {
        match std::fs::write(path.as_ref(), vec![0x5Au8; size]) {
            Ok(()) => ExecutionResult::ok(""),
            Err(e) => ExecutionResult::failed(1, e.to_string()),
        }
    }

    /// Simulate an AVIF encoder writing a valid file of `size` bytes.
    pub fn write_avif_output(path: impl AsRef<Path>, size: usize) -> ExecutionResult {
        match std::fs::write(path.as_ref(), avif_bytes(size)) {
            Ok(()) => ExecutionResult::ok(""),
            Err(e) => ExecutionResult::failed(1, e.to_string()),
        }
    }

    /// The argument following `flag`, if any.
    pub fn arg_after<'a>(request: &'a ExecutionRequest, flag: &str) -> Option<&'a OsStr> {
        request
            .args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| request.args.get(i + 1))
            .map(|arg| arg.as_os_str())
    }

    /// The last argument of the request.
    pub fn last_arg(request: &ExecutionRequest) -> PathBuf {
        request
            .args
            .last()
            .map(PathBuf::from)
            .unwrap_or_default()
    }

    /// Whether `request` is one of the registry probes for its binary.
    pub fn is_probe(request: &ExecutionRequest) -> bool {
        match find_encoder(&request.binary_name()) {
            Some(spec) => {
                request.has_single_arg(spec.test_command) || request.has_single_arg(spec.version_flag)
            }
            None => false,
        }
    }

    /// Resolver over `bin_root` with an in-memory cache and no `PATH` fallback.
    pub fn resolver_for(bin_root: &Path, executor: Arc<dyn Executor>) -> CapabilityResolver {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        CapabilityResolver::new(&ResolverConfig::with_bin_root(bin_root), executor, cache)
            .with_locator(
                BinaryLocator::new(bin_root, PlatformKey::detect()).with_search_path(None),
            )
    }
}
