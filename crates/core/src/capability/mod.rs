//! Encoder capability resolution.
//!
//! Answers "is encoder X usable right now, where is it and which version"
//! for a fixed registry of known binaries. Results are cached per platform
//! behind a [`CacheStore`] with a TTL and can be refreshed on demand.
//!
//! Binaries are looked up in this order:
//!
//! ```text
//! <bin_root>/<os>-<arch>/<name>[.exe]
//! <bin_root>/<os>/<name>[.exe]
//! <bin_root>/<name>[.exe]
//! each directory on PATH
//! ```

mod cache;
mod config;
mod error;
mod locate;
mod registry;
mod resolver;
mod types;

pub use cache::{CacheStore, MemoryCache};
pub use config::ResolverConfig;
pub use error::CapabilityError;
pub use locate::BinaryLocator;
pub use registry::{
    default_registry, find_encoder, AVIFENC, CAVIF, CONVERT, CWEBP, DWEBP, GIFSICLE, JPEGOPTIM,
    MAGICK, OPTIPNG,
};
pub use resolver::{parse_version, CapabilityResolver, CACHE_KEY_PREFIX};
pub use types::{Arch, CapabilityMap, CapabilityRecord, EncoderSpec, Os, PlatformKey, SystemInfo};
