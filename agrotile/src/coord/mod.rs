//! Coordinate conversion module
//!
//! Provides conversions between slippy-map tile addresses and geographic
//! bounding boxes in EPSG:4326, plus tile enumeration over a region.

mod types;

pub use types::{
    CoordError, GeoBoundingBox, TileCoordinate, TileRange, TileRangeIter, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

use types::grid_size;

/// Converts a tile address to its geographic bounding box.
///
/// Longitude is linear in `x / 2^z`. The top and bottom edges use the
/// inverse Web Mercator transform `atan(sinh(π(1 − 2y/n)))`.
///
/// # Errors
///
/// Returns `InvalidZoom` for `z > 22` and `InvalidCoordinate` when `x` or
/// `y` is outside `0..2^z`.
pub fn tile_to_bbox(z: u8, x: u32, y: u32) -> Result<GeoBoundingBox, CoordError> {
    let tile = TileCoordinate::new(z, x, y)?;
    let n = grid_size(tile.z) as f64;

    let min_lon = tile.x as f64 / n * 360.0 - 180.0;
    let max_lon = (tile.x as f64 + 1.0) / n * 360.0 - 180.0;

    let max_lat = row_to_lat(tile.y as f64, n);
    let min_lat = row_to_lat(tile.y as f64 + 1.0, n);

    Ok(GeoBoundingBox {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
    })
}

/// Computes the inclusive range of tiles overlapping `bbox` at `zoom`.
///
/// Indices are clamped to `[0, 2^z − 1]`, so a box reaching past the
/// Web Mercator latitude limit still yields the edge rows.
pub fn tile_range_for_bbox(bbox: &GeoBoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    let n = grid_size(zoom);

    let x_a = lon_to_col(bbox.min_lon, n);
    let x_b = lon_to_col(bbox.max_lon, n);
    // Rows grow southwards: the northern edge gives the smaller index.
    let y_a = lat_to_row(bbox.max_lat, n);
    let y_b = lat_to_row(bbox.min_lat, n);

    Ok(TileRange {
        z: zoom,
        x_min: x_a.min(x_b),
        x_max: x_a.max(x_b),
        y_min: y_a.min(y_b),
        y_max: y_a.max(y_b),
    })
}

/// Lists the tiles overlapping `bbox` at `zoom`.
///
/// Order is deterministic: `x` ascending outer, `y` ascending inner.
pub fn tiles_covering_bbox(
    bbox: &GeoBoundingBox,
    zoom: u8,
) -> Result<Vec<TileCoordinate>, CoordError> {
    Ok(tile_range_for_bbox(bbox, zoom)?.iter().collect())
}

#[inline]
fn row_to_lat(row: f64, n: f64) -> f64 {
    let lat_rad = (PI * (1.0 - 2.0 * row / n)).sinh().atan();
    lat_rad * 180.0 / PI
}

#[inline]
fn lon_to_col(lon: f64, n: u64) -> u32 {
    let col = ((lon + 180.0) / 360.0 * n as f64).floor();
    clamp_index(col, n)
}

#[inline]
fn lat_to_row(lat: f64, n: u64) -> u32 {
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT) * PI / 180.0;
    let row = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n as f64).floor();
    clamp_index(row, n)
}

#[inline]
fn clamp_index(value: f64, n: u64) -> u32 {
    value.clamp(0.0, (n - 1) as f64) as u32
}
