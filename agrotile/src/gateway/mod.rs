//! Tile fetch gateway.
//!
//! [`TileFetchGateway`] answers a single tile request:
//!
//! 1. Validate the date and tile address, derive the tile footprint.
//! 2. Look up the cache. A hit whose validator matches `If-None-Match`
//!    yields [`TileResponse::NotModified`]; any other hit returns the
//!    cached payload.
//! 3. On a miss, render through the imagery provider, store the result
//!    with the configured TTL and return it.
//!
//! Provider failures surface as [`TileError`] with a retryability flag.
//! The gateway never retries on its own.

mod fetch;
mod types;

pub use fetch::{validator_matches, TileFetchGateway, DEFAULT_TILE_TTL_SECS};
pub use types::{TileError, TileQuery, TileResponse, TileSource};
