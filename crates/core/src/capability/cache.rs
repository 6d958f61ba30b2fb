//! TTL key-value store used to cache capability maps.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A key-value store with per-entry expiry.
///
/// Any TTL-capable store works: the in-process [`MemoryCache`], or an adapter
/// over the host's own option/transient storage.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Removes a value.
    async fn delete(&self, key: &str);
}

/// In-memory [`CacheStore`].
///
/// An entry whose expiry does not fit in an `Instant` never expires.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Value, Option<Instant>)>>,
}

fn is_live(expires_at: Option<Instant>) -> bool {
    expires_at.is_none_or(|at| Instant::now() < at)
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, expires_at)) if is_live(*expires_at) => Some(value.clone()),
            _ => None,
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl);
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expiry)| is_live(*expiry));
        entries.insert(key.to_string(), (value, expires_at));
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache
            .set("capability-status:linux-x64", json!({"cwebp": true}), Duration::from_secs(60))
            .await;
        let value = cache.get("capability-status:linux-x64").await.unwrap();
        assert_eq!(value["cwebp"], true);
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryCache::new();
        cache.set("key", json!(1), Duration::from_millis(20)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("key").await.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("key", json!(1), Duration::from_secs(60)).await;
        cache.delete("key").await;
        assert!(cache.get("key").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_prunes_expired_entries() {
        let cache = MemoryCache::new();
        cache.set("old", json!(1), Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.set("new", json!(2), Duration::from_secs(60)).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache
            .set("capability-status:linux-x64", json!({"cwebp": true}), Duration::from_secs(u64::MAX))
            .await;
        assert!(cache.get("capability-status:linux-x64").await.is_some());
    }
}
