//! Core traits for the byte cache.
//!
//! The `Cache` trait is a domain-agnostic key-value interface. Tile
//! semantics (record encoding, validators, expiry metadata) live in
//! [`TileCacheStore`](super::TileCacheStore), which wraps any `Cache`.
//!
//! # Design Principles
//!
//! - **String keys**: human-readable in logs
//! - **`Bytes` values**: opaque payloads, cheap to clone out of the cache
//! - **Per-entry TTL**: each write chooses its own lifetime
//! - **Dyn-compatible**: uses `Pin<Box<dyn Future>>` for trait object support

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Result of a garbage collection pass.
#[derive(Debug, Clone, Default)]
pub struct GcResult {
    /// Number of entries removed.
    pub entries_removed: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for GcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GC: removed {} entries, freed {} bytes in {}ms",
            self.entries_removed, self.bytes_freed, self.duration_ms
        )
    }
}

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum ServiceCacheError {
    /// Value exceeds maximum allowed size.
    #[error("Value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: usize, max: u64 },

    /// A stored record could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Generic cache interface for key-value storage.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Writes to the same key are last-write-wins.
pub trait Cache: Send + Sync {
    /// Store a value under `key`, replacing any previous value.
    ///
    /// `ttl` of `None` keeps the entry until it is evicted for space.
    fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), ServiceCacheError>>;

    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` on a miss or when the entry has expired.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Bytes>, ServiceCacheError>>;

    /// Delete a value by key. Returns whether the key existed.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Check if a key exists without retrieving the value.
    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Current weighted size in bytes.
    fn size_bytes(&self) -> u64;

    /// Current number of entries.
    fn entry_count(&self) -> u64;

    /// Configured maximum size in bytes.
    fn max_size_bytes(&self) -> u64;

    /// Run pending maintenance (expiry, eviction).
    fn gc(&self) -> BoxFuture<'_, Result<GcResult, ServiceCacheError>>;
}
