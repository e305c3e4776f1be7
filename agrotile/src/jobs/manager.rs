//! Preprocess job manager.
//!
//! Accepts "warm this region" submissions, deduplicates them through
//! idempotency hashes and drives each job on a detached tokio task.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::coord::{tile_range_for_bbox, GeoBoundingBox, MAX_ZOOM};
use crate::gateway::{TileQuery, TileSource};
use crate::tile::{ImageryDate, DEFAULT_CLOUD_THRESHOLD};

use super::idempotency::canonical_hash;
use super::store::{Insertion, JobStore};
use super::types::{
    JobError, JobSnapshot, JobStatus, PreprocessJob, PreprocessRequest, SubmittedJob,
    MAX_IDEMPOTENCY_KEY_LEN,
};

/// Default zoom level for warming.
pub const DEFAULT_PREPROCESS_ZOOM: u8 = 12;

/// Default cap on tiles warmed per job.
pub const DEFAULT_MAX_PREPROCESS_TILES: usize = 200;

/// Upper bound for concurrent tile fetches within one job.
pub const MAX_WARM_CONCURRENCY: usize = 8;

/// Tuning for preprocess jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessSettings {
    /// Zoom level tiles are enumerated at.
    pub zoom: u8,
    /// Tiles beyond this count are dropped.
    pub max_tiles: usize,
    /// Concurrent tile fetches per job (1 = sequential).
    pub warm_concurrency: usize,
    /// Jobs allowed to warm at once, system-wide.
    pub max_concurrent_jobs: usize,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_PREPROCESS_ZOOM,
            max_tiles: DEFAULT_MAX_PREPROCESS_TILES,
            warm_concurrency: 1,
            max_concurrent_jobs: 2,
        }
    }
}

impl PreprocessSettings {
    /// Clamps every field into its supported range.
    pub fn normalized(self) -> Self {
        Self {
            zoom: self.zoom.min(MAX_ZOOM),
            max_tiles: self.max_tiles.max(1),
            warm_concurrency: self.warm_concurrency.clamp(1, MAX_WARM_CONCURRENCY),
            max_concurrent_jobs: self.max_concurrent_jobs.max(1),
        }
    }
}

/// Runs cache-warming jobs.
///
/// Cloning is cheap; clones share the store, tile source and job permits.
#[derive(Clone)]
pub struct PreprocessJobManager {
    store: Arc<dyn JobStore>,
    source: Arc<dyn TileSource>,
    settings: PreprocessSettings,
    permits: Arc<Semaphore>,
}

impl PreprocessJobManager {
    pub fn new(
        store: Arc<dyn JobStore>,
        source: Arc<dyn TileSource>,
        settings: PreprocessSettings,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            store,
            source,
            permits: Arc::new(Semaphore::new(settings.max_concurrent_jobs)),
            settings,
        }
    }

    pub fn settings(&self) -> &PreprocessSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Validates and records a job, then schedules it.
    ///
    /// Returns before any tile is fetched. With an idempotency key, a
    /// resubmission of the exact same payload returns the existing job.
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        request: PreprocessRequest,
        idempotency_key: Option<&str>,
    ) -> Result<SubmittedJob, JobError> {
        let bbox = GeoBoundingBox::from_array(request.bbox)?;
        let date = ImageryDate::parse(&request.date)?;

        let idempotency_hash = match idempotency_key.filter(|k| !k.is_empty()) {
            Some(key) if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN => {
                return Err(JobError::InvalidRequest(format!(
                    "idempotency key longer than {} characters",
                    MAX_IDEMPOTENCY_KEY_LEN
                )));
            }
            Some(key) => Some(canonical_hash(
                key,
                &bbox,
                &date,
                &request.bands,
                request.cloud_mask,
            )),
            None => None,
        };

        let job = PreprocessJob::queued(bbox, date, request.bands, request.cloud_mask);
        let job_id = job.job_id;

        match self.store.insert(job, idempotency_hash) {
            Insertion::Existing(existing) => {
                debug!(job_id = %existing.job_id, status = %existing.status, "Idempotent resubmission");
                return Ok(SubmittedJob {
                    job_id: existing.job_id,
                    status: existing.status,
                });
            }
            Insertion::Created => {}
        }

        info!(
            job_id = %job_id,
            bbox = ?bbox.to_array(),
            date = %date,
            zoom = self.settings.zoom,
            "Preprocess job queued"
        );

        let manager = self.clone();
        tokio::spawn(async move { manager.run(job_id).await });

        Ok(SubmittedJob {
            job_id,
            status: JobStatus::Queued,
        })
    }

    /// Minimal status view of a job.
    pub fn get_job(&self, job_id: &Uuid) -> Option<JobSnapshot> {
        self.store.get(job_id).map(|job| job.snapshot())
    }

    /// Full job record including tile counters.
    pub fn job_details(&self, job_id: &Uuid) -> Option<PreprocessJob> {
        self.store.get(job_id)
    }

    /// Worker entry point. Waits for a job permit, then warms.
    async fn run(self, job_id: Uuid) {
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.fail(&job_id, &e.to_string());
                return;
            }
        };

        // The warm loop runs on its own task so a panic inside it still
        // leaves the job in a terminal state.
        let worker = self.clone();
        let outcome = tokio::spawn(async move { worker.warm(job_id).await }).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.fail(&job_id, &e.to_string()),
            Err(join_error) => {
                let err = JobError::Worker(join_error.to_string());
                self.fail(&job_id, &err.to_string());
            }
        }
    }

    async fn warm(&self, job_id: Uuid) -> Result<(), JobError> {
        let job = self.store.get(&job_id).ok_or(JobError::NotFound(job_id))?;
        self.store
            .update(&job_id, &mut |j| j.status = JobStatus::Processing);

        let zoom = self.settings.zoom;
        let range = tile_range_for_bbox(&job.bbox, zoom)?;
        let max_tiles = self.settings.max_tiles as u64;
        let tiles_total = range.len().min(max_tiles);

        if range.len() > max_tiles {
            info!(
                job_id = %job_id,
                covering = range.len(),
                warming = tiles_total,
                "Region exceeds tile cap, dropping excess tiles"
            );
        }
        self.store.update(&job_id, &mut |j| j.tiles_total = tiles_total);

        let date = job.date.to_string();
        let queries = range.iter().take(self.settings.max_tiles).map(|coord| {
            TileQuery::new(coord.z, coord.x, coord.y, date.clone())
                .with_bands(job.bands.clone())
                .with_cloud_threshold(DEFAULT_CLOUD_THRESHOLD)
        });

        stream::iter(queries)
            .map(|query| {
                let source = Arc::clone(&self.source);
                async move {
                    let (x, y) = (query.x, query.y);
                    (x, y, source.fetch_tile(query).await)
                }
            })
            .buffer_unordered(self.settings.warm_concurrency)
            .for_each(|(x, y, result)| {
                match result {
                    Ok(_) => {
                        self.store.update(&job_id, &mut |j| j.tiles_warmed += 1);
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, z = zoom, x = x, y = y, error = %e, "Tile warm failed");
                        self.store.update(&job_id, &mut |j| j.tiles_failed += 1);
                    }
                }
                futures::future::ready(())
            })
            .await;

        self.store
            .update(&job_id, &mut |j| j.status = JobStatus::Completed);

        if let Some(done) = self.store.get(&job_id) {
            info!(
                job_id = %job_id,
                tiles_total = done.tiles_total,
                tiles_warmed = done.tiles_warmed,
                tiles_failed = done.tiles_failed,
                "Preprocess job completed"
            );
        }
        Ok(())
    }

    fn fail(&self, job_id: &Uuid, message: &str) {
        error!(job_id = %job_id, error = %message, "Preprocess job failed");
        let message = message.to_string();
        self.store.update(job_id, &mut |j| {
            j.status = JobStatus::Failed;
            j.error = Some(message.clone());
        });
    }
}
