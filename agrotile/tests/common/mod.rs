//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agrotile::cache::{BoxFuture, MemoryCacheProvider, TileCacheStore};
use agrotile::gateway::TileFetchGateway;
use agrotile::jobs::{InMemoryJobStore, PreprocessJob, PreprocessJobManager, PreprocessSettings};
use agrotile::provider::{ImageryProvider, ProviderError, RenderRequest, RenderedImage};
use uuid::Uuid;

/// Imagery provider that renders a payload derived from the tile footprint.
#[derive(Default)]
pub struct ScriptedProvider {
    calls: AtomicUsize,
    /// Every n-th render (1-based) fails with HTTP 500.
    fail_every: Option<usize>,
    /// When set, every render fails with this error.
    always_fail: Option<ProviderError>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: Some(n),
            ..Self::default()
        }
    }

    pub fn always_failing(error: ProviderError) -> Self {
        Self {
            always_fail: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageryProvider for ScriptedProvider {
    fn render<'a>(
        &'a self,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, Result<RenderedImage, ProviderError>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(error) = &self.always_fail {
                return Err(error.clone());
            }
            if self.fail_every.is_some_and(|n| call % n == 0) {
                return Err(ProviderError::Render { status: 500 });
            }

            let [min_lon, min_lat, _, _] = request.bbox.to_array();
            Ok(RenderedImage {
                bytes: format!(
                    "png:{:.6}:{:.6}:{}",
                    min_lon,
                    min_lat,
                    request.script.input_bands().join("+")
                )
                .into_bytes(),
                content_type: "image/png".to_string(),
            })
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub const TTL_SECS: u64 = 3600;

pub fn gateway(provider: Arc<ScriptedProvider>) -> Arc<TileFetchGateway> {
    let cache = Arc::new(MemoryCacheProvider::new(64 * 1024 * 1024));
    Arc::new(TileFetchGateway::new(
        provider,
        TileCacheStore::new(cache),
        TTL_SECS,
    ))
}

pub fn manager(gateway: Arc<TileFetchGateway>, settings: PreprocessSettings) -> PreprocessJobManager {
    PreprocessJobManager::new(Arc::new(InMemoryJobStore::new()), gateway, settings)
}

/// Polls until the job reaches a terminal state.
pub async fn wait_for_terminal(manager: &PreprocessJobManager, job_id: &Uuid) -> PreprocessJob {
    for _ in 0..500 {
        if let Some(job) = manager.job_details(job_id) {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish");
}
