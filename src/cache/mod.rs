//! Short-lived memoization of query, metrics and filter-option results.
//!
//! The cache is pure memoization: any entry may disappear at any time and
//! every failure (oversized payload, unparseable entry) degrades to a miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Result families sharing the cache. Each has its own key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Query,
    Metrics,
    FilterOptions,
}

impl CacheOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOp::Query => "query",
            CacheOp::Metrics => "metrics",
            CacheOp::FilterOptions => "filters",
        }
    }
}

/// Keys start with the tenant so a whole tenant can be purged by prefix.
pub fn cache_key<S: Serialize>(op: CacheOp, tenant: &str, spec: &S) -> String {
    let spec = serde_json::to_string(spec).unwrap_or_default();
    format!("{}|{}|{}", tenant, op.as_str(), spec)
}

pub fn tenant_prefix(tenant: &str) -> String {
    format!("{}|", tenant)
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Best effort: implementations may drop the write silently.
    async fn put(&self, key: &str, value: String, ttl: Duration);

    async fn remove_prefix(&self, prefix: &str);
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process TTL cache with a per-entry size ceiling
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_payload_bytes: usize,
}

impl MemoryCache {
    pub fn new(max_payload_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_payload_bytes,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        if value.len() > self.max_payload_bytes {
            tracing::warn!(
                "Dropping cache write for {}: {} bytes exceeds {}",
                key,
                value.len(),
                self.max_payload_bytes
            );
            return;
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry { value, expires_at: now + ttl },
        );
    }

    async fn remove_prefix(&self, prefix: &str) {
        self.entries.write().await.retain(|k, _| !k.starts_with(prefix));
    }
}

/// Typed JSON layer over a `CacheStore`
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, enabled: bool) -> Self {
        Self { store, ttl, enabled }
    }

    pub fn disabled(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, Duration::ZERO, false)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let raw = self.store.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(v) => {
                tracing::debug!("Cache hit: {}", key);
                Some(v)
            }
            Err(e) => {
                tracing::debug!("Unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        if !self.enabled {
            return;
        }
        match serde_json::to_string(value) {
            Ok(raw) => self.store.put(key, raw, self.ttl).await,
            Err(e) => tracing::warn!("Skipping cache write for {}: {}", key, e),
        }
    }

    pub async fn invalidate_tenant(&self, tenant: &str) {
        self.store.remove_prefix(&tenant_prefix(tenant)).await;
    }
}
