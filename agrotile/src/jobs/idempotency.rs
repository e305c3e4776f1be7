//! Canonical hashing of idempotent submissions.

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::coord::GeoBoundingBox;
use crate::tile::{BandSpec, ImageryDate};

/// Hash of an idempotency key together with the exact request payload.
///
/// The payload is rendered as JSON with sorted keys, so the hash only
/// depends on values. Reusing a key with different parameters yields a
/// different hash.
pub fn canonical_hash(
    idempotency_key: &str,
    bbox: &GeoBoundingBox,
    date: &ImageryDate,
    bands: &BandSpec,
    cloud_mask: bool,
) -> String {
    let canonical = json!({
        "idempotency_key": idempotency_key,
        "bbox": bbox.to_array(),
        "date": date.to_string(),
        "bands": bands.to_csv(),
        "cloud_mask": cloud_mask,
    });
    format!("{:x}", Sha256::digest(canonical.to_string().as_bytes()))
}
