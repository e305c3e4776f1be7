//! Preprocess jobs.
//!
//! A preprocess job warms the tile cache for a whole region: it
//! enumerates the tiles covering a bounding box at a fixed zoom, caps the
//! count, and fetches each tile through a [`TileSource`](crate::gateway::TileSource),
//! discarding the payloads.
//!
//! Warming is best effort. Individual tile failures are logged and
//! counted; the job still ends `completed`. Only an error outside the
//! per-tile loop ends it `failed`.

mod idempotency;
mod manager;
mod store;
mod types;

pub use idempotency::canonical_hash;
pub use manager::{
    PreprocessJobManager, PreprocessSettings, DEFAULT_MAX_PREPROCESS_TILES,
    DEFAULT_PREPROCESS_ZOOM, MAX_WARM_CONCURRENCY,
};
pub use store::{InMemoryJobStore, Insertion, JobStore};
pub use types::{
    JobError, JobSnapshot, JobStatus, PreprocessJob, PreprocessRequest, SubmittedJob,
    MAX_IDEMPOTENCY_KEY_LEN,
};
