//! In-memory TTL + LRU caches for search results and fetched content.
//!
//! [`TtlCache`] wraps a [`moka`] future cache configured for
//! least-recently-used eviction at a fixed capacity and a per-entry
//! time-to-live. Each instance is owned by whoever builds it; nothing here
//! is process-global.

use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use serde_json::Value;

/// String-keyed cache; a TTL or capacity of zero disables it.
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Option<Cache<String, V>>,
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        if ttl.is_zero() || max_entries == 0 {
            return Self::disabled();
        }
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { inner: Some(cache) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up `key`; an expired entry is a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        match self.inner {
            Some(ref cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        if let Some(ref cache) = self.inner {
            cache.insert(key.into(), value).await;
        }
    }

    /// Approximate number of live entries after pending maintenance runs.
    #[cfg(test)]
    async fn entry_count(&self) -> u64 {
        match self.inner {
            Some(ref cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        }
    }
}

/// Deterministic key for a request: `namespace:` followed by compact JSON.
///
/// `serde_json` keeps object keys sorted, so field order in `params` does
/// not matter.
pub fn request_key(namespace: &str, params: &Value) -> String {
    format!("{namespace}:{params}")
}
