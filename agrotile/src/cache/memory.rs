//! In-memory cache provider using moka.
//!
//! Wraps `moka::future::Cache` with a byte-size weigher and a per-entry
//! expiry policy, so each write can carry its own TTL.

use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::future::Cache as MokaCache;
use moka::Expiry;

use super::traits::{BoxFuture, Cache, GcResult, ServiceCacheError};

#[derive(Clone)]
struct StoredValue {
    data: Bytes,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryExpiry;

impl Expiry<String, StoredValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-memory cache provider using moka.
///
/// Memory-bounded by total value size with automatic LRU-style eviction.
pub struct MemoryCacheProvider {
    cache: MokaCache<String, StoredValue>,
    max_size_bytes: u64,
}

impl MemoryCacheProvider {
    /// Create a new memory cache provider bounded at `max_size_bytes`.
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            .weigher(|key: &String, value: &StoredValue| -> u32 {
                (key.len() + value.data.len()).min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .expire_after(PerEntryExpiry)
            .build();

        Self {
            cache,
            max_size_bytes,
        }
    }
}

impl Cache for MemoryCacheProvider {
    fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move {
            if value.len() as u64 > self.max_size_bytes {
                return Err(ServiceCacheError::ValueTooLarge {
                    size: value.len(),
                    max: self.max_size_bytes,
                });
            }
            self.cache.insert(key, StoredValue { data: value, ttl }).await;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Bytes>, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await.map(|v| v.data)) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.remove(&key).await.is_some()) })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.contains_key(&key)) })
    }

    fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    fn gc(&self) -> BoxFuture<'_, Result<GcResult, ServiceCacheError>> {
        Box::pin(async move {
            let start = Instant::now();
            let size_before = self.cache.weighted_size();
            let count_before = self.cache.entry_count();

            self.cache.run_pending_tasks().await;

            let size_after = self.cache.weighted_size();
            let count_after = self.cache.entry_count();

            Ok(GcResult {
                entries_removed: count_before.saturating_sub(count_after) as usize,
                bytes_freed: size_before.saturating_sub(size_after),
                duration_ms: start.elapsed().as_millis() as u64,
            })
        })
    }
}
