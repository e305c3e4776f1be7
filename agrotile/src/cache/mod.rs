//! Tile caching.
//!
//! Two layers:
//!
//! - [`Cache`]: generic, dyn-compatible byte cache with per-entry TTL.
//!   [`MemoryCacheProvider`] implements it on top of moka.
//! - [`TileCacheStore`]: tile records ([`CachedTile`]) with SHA-256
//!   validators, stored through any `Cache`.

mod memory;
mod tile_store;
mod traits;

pub use memory::MemoryCacheProvider;
pub use tile_store::{content_hash, CachedTile, TileCacheStore};
pub use traits::{BoxFuture, Cache, GcResult, ServiceCacheError};
