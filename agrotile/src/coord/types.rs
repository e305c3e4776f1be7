//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Geographic (EPSG:4326) longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted for slippy-map tiles
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Errors raised by coordinate validation and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Zoom level outside `MIN_ZOOM..=MAX_ZOOM`.
    #[error("zoom level {0} out of range (0-22)")]
    InvalidZoom(u8),

    /// Tile column or row outside the `2^z` grid.
    #[error("tile ({x}, {y}) out of range for zoom {z}")]
    InvalidCoordinate { z: u8, x: u32, y: u32 },

    /// Bounding box with inverted, empty, or out-of-range extents.
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

/// Slippy-map tile address.
///
/// `x` grows eastwards from the antimeridian, `y` grows southwards from
/// the northern Web Mercator limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Zoom level (0-22)
    pub z: u8,
    /// Column, 0 at west
    pub x: u32,
    /// Row, 0 at north
    pub y: u32,
}

impl TileCoordinate {
    /// Creates a validated tile coordinate.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }
        let n = grid_size(z);
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(CoordError::InvalidCoordinate { z, x, y });
        }
        Ok(Self { z, x, y })
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Axis-aligned longitude/latitude rectangle in EPSG:4326.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, validating ordering and range.
    ///
    /// Both axes must satisfy `min < max` and lie within
    /// `[-180, 180] × [-90, 90]`.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, CoordError> {
        let values = [min_lon, min_lat, max_lon, max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoordError::InvalidBoundingBox(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(CoordError::InvalidBoundingBox(
                "min must be less than max".to_string(),
            ));
        }
        if min_lon < MIN_LON || max_lon > MAX_LON || min_lat < -90.0 || max_lat > 90.0 {
            return Err(CoordError::InvalidBoundingBox(
                "coordinates out of EPSG:4326 range".to_string(),
            ));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Creates a bounding box from `[minLon, minLat, maxLon, maxLat]`.
    pub fn from_array(bbox: [f64; 4]) -> Result<Self, CoordError> {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    /// Returns the box as `[minLon, minLat, maxLon, maxLat]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

/// Inclusive rectangle of tile indices at a single zoom level.
///
/// Iterates column-major: `x` ascending in the outer loop, `y` ascending
/// in the inner loop, so enumeration is reproducible across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub z: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Number of tiles in the range; zero when either span is inverted.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let cols = u64::from(self.x_max - self.x_min) + 1;
        let rows = u64::from(self.y_max - self.y_min) + 1;
        cols * rows
    }

    /// True when `x_min > x_max` or `y_min > y_max`.
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    /// Returns an iterator over the tiles in enumeration order.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.x_min,
            next_y: self.y_min,
            done: self.is_empty(),
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoordinate;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    next_x: u32,
    next_y: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = TileCoordinate {
            z: self.range.z,
            x: self.next_x,
            y: self.next_y,
        };

        if self.next_y < self.range.y_max {
            self.next_y += 1;
        } else if self.next_x < self.range.x_max {
            self.next_x += 1;
            self.next_y = self.range.y_min;
        } else {
            self.done = true;
        }

        Some(tile)
    }
}

/// Number of tiles along one axis at `zoom`.
#[inline]
pub(crate) fn grid_size(zoom: u8) -> u64 {
    1u64 << zoom
}
