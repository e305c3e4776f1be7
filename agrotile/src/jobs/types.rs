//! Preprocess job types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::coord::{CoordError, GeoBoundingBox};
use crate::tile::{BandSpec, ImageryDate, InvalidDate};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 200;

/// Lifecycle state of a preprocess job.
///
/// `Queued → Processing → Completed | Failed`. Terminal states never
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to warm the cache for a region.
///
/// Fields are unvalidated; [`PreprocessJobManager::submit`](super::PreprocessJobManager::submit)
/// checks them.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessRequest {
    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub bbox: [f64; 4],
    pub date: String,
    pub bands: BandSpec,
    pub cloud_mask: bool,
}

/// Full job record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessJob {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub bbox: GeoBoundingBox,
    pub date: ImageryDate,
    pub bands: BandSpec,
    pub cloud_mask: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tiles scheduled after the per-job cap.
    pub tiles_total: u64,
    pub tiles_warmed: u64,
    pub tiles_failed: u64,
}

impl PreprocessJob {
    /// New job in the `Queued` state.
    pub fn queued(
        bbox: GeoBoundingBox,
        date: ImageryDate,
        bands: BandSpec,
        cloud_mask: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            status: JobStatus::Queued,
            bbox,
            date,
            bands,
            cloud_mask,
            created_at: now,
            updated_at: now,
            error: None,
            tiles_total: 0,
            tiles_warmed: 0,
            tiles_failed: 0,
        }
    }

    /// Minimal status view.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.job_id,
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// Status view returned by job queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmittedJob {
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// Job layer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The submission failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The job record disappeared before its worker ran.
    #[error("Job {0} not found")]
    NotFound(Uuid),

    /// The worker stopped outside the per-tile loop.
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<CoordError> for JobError {
    fn from(err: CoordError) -> Self {
        JobError::InvalidRequest(err.to_string())
    }
}

impl From<InvalidDate> for JobError {
    fn from(err: InvalidDate) -> Self {
        JobError::InvalidRequest(err.to_string())
    }
}
