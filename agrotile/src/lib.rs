//! AgroTile - satellite tile cache for farm monitoring
//!
//! Serves Sentinel-2 imagery as slippy-map tiles for a given day and band
//! selection, caching rendered tiles in memory with content validators, and
//! runs background jobs that pre-warm the cache over a field's bounding box.

pub mod app;
pub mod cache;
pub mod config;
pub mod coord;
pub mod gateway;
pub mod jobs;
pub mod logging;
pub mod provider;
pub mod server;
pub mod tile;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
