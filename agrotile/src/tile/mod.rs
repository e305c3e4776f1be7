//! Tile request types.
//!
//! A [`TileRequestKey`] captures every dimension that changes the rendered
//! imagery: tile address, acquisition day, band selection and cloud
//! threshold. Its [`cache_key`](TileRequestKey::cache_key) is the string
//! used by the tile cache.
//!
//! # Key Format
//!
//! `satellite:tile:{z}:{x}:{y}:{date}:{bands}:{cloud}`
//!
//! Example: `satellite:tile:12:2954:1969:2024-06-01:RGB:20`

mod bands;
mod date;

pub use bands::{BandSpec, ALLOWED_BANDS, RGB_ALIAS};
pub use date::{ImageryDate, InvalidDate};

use crate::coord::TileCoordinate;

/// Default maximum cloud coverage percentage.
pub const DEFAULT_CLOUD_THRESHOLD: u8 = 20;

/// Upper bound for the cloud coverage percentage.
pub const MAX_CLOUD_THRESHOLD: u8 = 100;

/// Prefix shared by all tile cache keys.
const KEY_PREFIX: &str = "satellite:tile";

/// Canonical identity of a rendered tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRequestKey {
    pub coordinate: TileCoordinate,
    pub date: ImageryDate,
    pub bands: BandSpec,
    pub cloud_threshold: u8,
}

impl TileRequestKey {
    /// Creates a key with the default cloud threshold.
    pub fn new(coordinate: TileCoordinate, date: ImageryDate, bands: BandSpec) -> Self {
        Self {
            coordinate,
            date,
            bands,
            cloud_threshold: DEFAULT_CLOUD_THRESHOLD,
        }
    }

    /// Sets the cloud threshold, capped at 100.
    pub fn with_cloud_threshold(mut self, cloud_threshold: u8) -> Self {
        self.cloud_threshold = cloud_threshold.min(MAX_CLOUD_THRESHOLD);
        self
    }

    /// Canonical cache key string.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            KEY_PREFIX,
            self.coordinate.z,
            self.coordinate.x,
            self.coordinate.y,
            self.date,
            self.bands.to_csv(),
            self.cloud_threshold
        )
    }
}
