//! HTTP surface.
//!
//! An axum router exposing the satellite API under `/api/v1/satellite`:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/tiles/:z/:x/:y?date&bands&cloud_lt` | Tile proxy with ETag support |
//! | POST | `/preprocess` | Queue a cache-warming job (202) |
//! | GET | `/preprocess/:job_id` | Poll job status |
//!
//! JSON responses use the envelope
//! `{success, data | error, meta: {timestamp}}`.

mod error;
mod routes;

pub use error::{json_error, ApiError};
pub use routes::{correlation_id, router, ApiState, PreprocessBody, TileParams, API_PREFIX};
