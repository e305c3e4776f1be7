//! Tile cache store.
//!
//! Wraps a generic [`Cache`] with tile semantics:
//! - Key translation: [`TileRequestKey`] → `"satellite:tile:…"`
//! - Record encoding: payload plus metadata, serialized with bincode
//! - Validators: SHA-256 content hash computed at write time
//!
//! Cache failures never reach callers. A read error or an undecodable
//! record is logged and reported as a miss; a write error is logged and
//! the freshly built record is still returned.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::tile::TileRequestKey;

use super::traits::{Cache, ServiceCacheError};

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A cached tile payload with its validator and expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTile {
    pub payload: Vec<u8>,
    pub content_hash: String,
    pub mime_type: String,
    pub cached_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CachedTile {
    /// Instant after which the record is no longer served, or `None` if
    /// the TTL reaches past the representable calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.ttl_seconds).ok()?;
        let ttl = chrono::Duration::try_seconds(secs)?;
        self.cached_at.checked_add_signed(ttl)
    }

    /// Whether the record has outlived its TTL at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }

    fn encode(&self) -> Result<Bytes, ServiceCacheError> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(|e| ServiceCacheError::Codec(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, ServiceCacheError> {
        bincode::deserialize(bytes).map_err(|e| ServiceCacheError::Codec(e.to_string()))
    }
}

/// Keyed tile cache with TTL and content-hash validators.
#[derive(Clone)]
pub struct TileCacheStore {
    cache: Arc<dyn Cache>,
}

impl TileCacheStore {
    /// Create a store over `cache`.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Canonical cache key for a tile request.
    pub fn key(request: &TileRequestKey) -> String {
        request.cache_key()
    }

    /// Look up a tile.
    ///
    /// Returns `None` on a miss, an expired record, a corrupt record or a
    /// backend error.
    pub async fn get(&self, key: &str) -> Option<CachedTile> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, key = %key, "Tile cache get failed");
                return None;
            }
        };

        let tile = match CachedTile::decode(&raw) {
            Ok(tile) => tile,
            Err(e) => {
                warn!(error = %e, key = %key, "Discarding corrupt tile cache record");
                return None;
            }
        };

        if tile.is_expired_at(Utc::now()) {
            debug!(key = %key, "Tile cache record expired");
            return None;
        }

        Some(tile)
    }

    /// Store a tile payload and return the record that was written.
    pub async fn put(
        &self,
        key: &str,
        payload: Vec<u8>,
        mime_type: &str,
        ttl_seconds: u64,
    ) -> CachedTile {
        let tile = CachedTile {
            content_hash: content_hash(&payload),
            payload,
            mime_type: mime_type.to_string(),
            cached_at: Utc::now(),
            ttl_seconds,
        };

        let encoded = match tile.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, key = %key, "Tile cache record encoding failed");
                return tile;
            }
        };

        let ttl = Some(Duration::from_secs(ttl_seconds));
        if let Err(e) = self.cache.set(key, encoded, ttl).await {
            warn!(error = %e, key = %key, "Tile cache set failed");
        }

        tile
    }

    /// Remove a tile. Returns whether it was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.cache.delete(key).await.unwrap_or(false)
    }

    /// Current cache size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.cache.size_bytes()
    }

    /// Current number of cached tiles.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::traits::{BoxFuture, GcResult};
    use crate::cache::MemoryCacheProvider;

    fn store() -> TileCacheStore {
        TileCacheStore::new(Arc::new(MemoryCacheProvider::new(10_000_000)))
    }

    /// Cache whose every operation fails.
    struct BrokenCache;

    impl Cache for BrokenCache {
        fn set(
            &self,
            _key: &str,
            _value: Bytes,
            _ttl: Option<Duration>,
        ) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
            Box::pin(async { Err(ServiceCacheError::Provider("down".to_string())) })
        }

        fn get(&self, _key: &str) -> BoxFuture<'_, Result<Option<Bytes>, ServiceCacheError>> {
            Box::pin(async { Err(ServiceCacheError::Provider("down".to_string())) })
        }

        fn delete(&self, _key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
            Box::pin(async { Err(ServiceCacheError::Provider("down".to_string())) })
        }

        fn contains(&self, _key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
            Box::pin(async { Err(ServiceCacheError::Provider("down".to_string())) })
        }

        fn size_bytes(&self) -> u64 {
            0
        }

        fn entry_count(&self) -> u64 {
            0
        }

        fn max_size_bytes(&self) -> u64 {
            0
        }

        fn gc(&self) -> BoxFuture<'_, Result<GcResult, ServiceCacheError>> {
            Box::pin(async { Ok(GcResult::default()) })
        }
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = store();
        let written = store.put("k", b"png-bytes".to_vec(), "image/png", 600).await;
        let read = store.get("k").await.unwrap();

        assert_eq!(read, written);
        assert_eq!(read.payload, b"png-bytes".to_vec());
        assert_eq!(read.mime_type, "image/png");
        assert_eq!(read.ttl_seconds, 600);
        assert_eq!(read.content_hash, content_hash(b"png-bytes"));
    }

    #[tokio::test]
    async fn test_identical_bytes_hash_identically() {
        let store = store();
        let first = store.put("k", b"same".to_vec(), "image/png", 600).await;
        let second = store.put("k", b"same".to_vec(), "image/png", 600).await;
        assert_eq!(first.content_hash, second.content_hash);

        let other = store.put("k2", b"different".to_vec(), "image/png", 600).await;
        assert_ne!(first.content_hash, other.content_hash);
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        assert!(store().get("absent").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_miss() {
        let backend = Arc::new(MemoryCacheProvider::new(10_000_000));
        backend
            .set("k", Bytes::from_static(b"\x01\x02not-bincode"), None)
            .await
            .unwrap();

        let store = TileCacheStore::new(backend);
        assert!(store.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_record_is_a_miss() {
        let backend = Arc::new(MemoryCacheProvider::new(10_000_000));
        let stale = CachedTile {
            payload: b"old".to_vec(),
            content_hash: content_hash(b"old"),
            mime_type: "image/png".to_string(),
            cached_at: Utc::now() - chrono::Duration::seconds(120),
            ttl_seconds: 60,
        };
        backend.set("k", stale.encode().unwrap(), None).await.unwrap();

        let store = TileCacheStore::new(backend);
        assert!(store.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failures_are_swallowed() {
        let store = TileCacheStore::new(Arc::new(BrokenCache));

        let written = store.put("k", b"x".to_vec(), "image/png", 60).await;
        assert_eq!(written.payload, b"x".to_vec());
        assert!(store.get("k").await.is_none());
        assert!(!store.delete("k").await);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let tile = CachedTile {
            payload: Vec::new(),
            content_hash: String::new(),
            mime_type: "image/png".to_string(),
            cached_at: Utc::now(),
            ttl_seconds: u64::MAX,
        };
        assert!(!tile.is_expired_at(Utc::now()));
    }
}
