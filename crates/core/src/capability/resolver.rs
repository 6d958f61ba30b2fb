//! The capability resolver.

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::cache::CacheStore;
use super::config::ResolverConfig;
use super::error::CapabilityError;
use super::locate::BinaryLocator;
use super::registry::{default_registry, validate_registry};
use super::types::{CapabilityMap, CapabilityRecord, EncoderSpec, PlatformKey, SystemInfo};
use crate::executor::{ExecutionRequest, Executor};
use crate::metrics;

/// Prefix of the cache key; the platform key is appended.
pub const CACHE_KEY_PREFIX: &str = "capability-status:";

/// Tried in order; the first match wins.
static VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)version:?\s+v?([0-9]+\.[0-9]+(?:\.[0-9]+)?)",
        r"(?i)v([0-9]+\.[0-9]+(?:\.[0-9]+)?)",
        r"([0-9]+\.[0-9]+(?:\.[0-9]+)?)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Extracts a version token from tool output.
pub fn parse_version(output: &str) -> Option<String> {
    VERSION_PATTERNS.iter().find_map(|re| {
        re.captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Resolves which encoders are usable on this host.
///
/// Concurrent readers share the cached map. Recomputation is serialized so
/// two refreshes never probe at the same time.
pub struct CapabilityResolver {
    registry: Vec<EncoderSpec>,
    locator: BinaryLocator,
    executor: Arc<dyn Executor>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    probe_timeout: Duration,
    refresh_lock: Mutex<()>,
}

impl CapabilityResolver {
    /// Creates a resolver for the detected platform with the built-in registry.
    pub fn new(
        config: &ResolverConfig,
        executor: Arc<dyn Executor>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            registry: default_registry(),
            locator: BinaryLocator::new(&config.bin_root, PlatformKey::detect()),
            executor,
            cache,
            ttl: Duration::from_secs(config.cache_ttl_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replaces the registry.
    pub fn with_registry(mut self, registry: Vec<EncoderSpec>) -> Result<Self, CapabilityError> {
        validate_registry(&registry)?;
        self.registry = registry;
        Ok(self)
    }

    /// Replaces the binary locator.
    pub fn with_locator(mut self, locator: BinaryLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Overrides the cache lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn platform(&self) -> PlatformKey {
        self.locator.platform()
    }

    pub fn bin_root(&self) -> &Path {
        self.locator.bin_root()
    }

    pub fn registry(&self) -> &[EncoderSpec] {
        &self.registry
    }

    /// Registry entry for `name`.
    pub fn spec(&self, name: &str) -> Result<&EncoderSpec, CapabilityError> {
        self.registry
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| CapabilityError::unknown_encoder(name))
    }

    /// Cache key for the current platform.
    pub fn cache_key(&self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.platform())
    }

    /// Looks up a binary on disk without probing it.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.locator.locate(name)
    }

    /// Locates and self-tests one encoder.
    pub async fn probe(&self, spec: &EncoderSpec) -> CapabilityRecord {
        let record = self.probe_inner(spec).await;
        metrics::record_probe(spec.name, record.available);
        match &record.error {
            None => info!(
                encoder = spec.name,
                available = record.available,
                version = record.version.as_deref().unwrap_or("unknown"),
                "Capability probe"
            ),
            Some(error) => info!(
                encoder = spec.name,
                available = record.available,
                error = %error,
                "Capability probe"
            ),
        }
        record
    }

    async fn probe_inner(&self, spec: &EncoderSpec) -> CapabilityRecord {
        let Some(path) = self.locate(spec.name) else {
            return CapabilityRecord::not_found();
        };

        let test = self
            .executor
            .execute(
                ExecutionRequest::new(&path, [spec.test_command]).with_timeout(self.probe_timeout),
            )
            .await;
        if !test.success {
            let error = if test.stderr.is_empty() {
                "execution failed".to_string()
            } else {
                test.stderr
            };
            return CapabilityRecord::failed(path, error);
        }

        let version_run = self
            .executor
            .execute(
                ExecutionRequest::new(&path, [spec.version_flag]).with_timeout(self.probe_timeout),
            )
            .await;
        let version = parse_version(&version_run.combined_output())
            .unwrap_or_else(|| "unknown".to_string());

        CapabilityRecord::available(path, version)
    }

    /// Cached capability map, recomputed when absent or expired.
    pub async fn get_all(&self) -> CapabilityMap {
        if let Some(map) = self.cached().await {
            return map;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have filled the cache while we waited.
        if let Some(map) = self.cached().await {
            return map;
        }
        self.compute_and_store().await
    }

    /// Recomputes every record and replaces the cached map.
    pub async fn refresh(&self) -> CapabilityMap {
        let _guard = self.refresh_lock.lock().await;
        info!(platform = %self.platform(), "Refreshing encoder capabilities");
        self.compute_and_store().await
    }

    /// Record for one encoder.
    pub async fn get(&self, name: &str) -> Result<CapabilityRecord, CapabilityError> {
        self.spec(name)?;
        let map = self.get_all().await;
        Ok(map
            .get(name)
            .cloned()
            .unwrap_or_else(CapabilityRecord::not_found))
    }

    /// Whether `name` is usable right now.
    pub async fn is_available(&self, name: &str) -> Result<bool, CapabilityError> {
        Ok(self.get(name).await?.available)
    }

    /// Resolved path of `name` if it is usable.
    pub async fn available_path(&self, name: &str) -> Result<Option<PathBuf>, CapabilityError> {
        let record = self.get(name).await?;
        Ok(if record.available { record.path } else { None })
    }

    /// Required encoders that are not available.
    pub async fn missing_required(&self) -> Vec<EncoderSpec> {
        let map = self.get_all().await;
        self.missing_in(&map)
    }

    fn missing_in(&self, map: &CapabilityMap) -> Vec<EncoderSpec> {
        self.registry
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| !map.get(spec.name).is_some_and(|record| record.available))
            .copied()
            .collect()
    }

    /// Platform, binary root and the cached capability map.
    pub async fn system_info(&self) -> SystemInfo {
        let encoders = self.get_all().await;
        self.describe(encoders)
    }

    /// Like [`system_info`](Self::system_info) but refreshes first.
    pub async fn refresh_system_info(&self) -> SystemInfo {
        let encoders = self.refresh().await;
        self.describe(encoders)
    }

    fn describe(&self, encoders: CapabilityMap) -> SystemInfo {
        let platform = self.platform();
        let missing_required = self
            .missing_in(&encoders)
            .into_iter()
            .map(|spec| spec.name.to_string())
            .collect();
        SystemInfo {
            platform: platform.to_string(),
            os: platform.os,
            arch: platform.arch,
            bin_root: self.bin_root().to_path_buf(),
            encoders,
            missing_required,
        }
    }

    async fn cached(&self) -> Option<CapabilityMap> {
        let value = self.cache.get(&self.cache_key()).await?;
        match serde_json::from_value(value) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable capability cache entry");
                None
            }
        }
    }

    async fn compute_and_store(&self) -> CapabilityMap {
        let records = join_all(self.registry.iter().map(|spec| self.probe(spec))).await;
        let map: CapabilityMap = self
            .registry
            .iter()
            .map(|spec| spec.name.to_string())
            .zip(records)
            .collect();

        match serde_json::to_value(&map) {
            Ok(value) => self.cache.set(&self.cache_key(), value, self.ttl).await,
            Err(e) => warn!(error = %e, "Failed to serialize capability map"),
        }
        debug!(
            platform = %self.platform(),
            available = map.values().filter(|r| r.available).count(),
            total = map.len(),
            "Capability map computed"
        );
        map
    }
}
