//! Application bootstrap implementation.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::cache::{Cache, MemoryCacheProvider, TileCacheStore};
use crate::gateway::{TileFetchGateway, TileSource};
use crate::jobs::{InMemoryJobStore, JobStore, PreprocessJobManager};
use crate::provider::{
    AsyncReqwestClient, ImageryProvider, ProviderTokenCache, SentinelHubProvider,
};
use crate::server::{router, ApiState};

/// The assembled service: tile gateway, job manager and HTTP router.
pub struct AgroTileApp {
    config: AppConfig,
    gateway: Arc<TileFetchGateway>,
    jobs: PreprocessJobManager,
}

impl AgroTileApp {
    /// Builds the service against Sentinel Hub.
    ///
    /// No network traffic happens here; the first token exchange is lazy.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        let client = Arc::new(AsyncReqwestClient::new().map_err(AppError::HttpClient)?);
        let tokens = ProviderTokenCache::new(
            Arc::clone(&client),
            config.provider.token_url.clone(),
            config.provider.credentials.clone(),
            config.provider.token_timeout,
        );
        let provider = SentinelHubProvider::new(
            client,
            tokens,
            &config.provider.base_url,
            config.provider.fetch_timeout,
        );

        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Builds the service around an arbitrary imagery provider.
    pub fn with_provider(config: AppConfig, provider: Arc<dyn ImageryProvider>) -> Self {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCacheProvider::new(config.memory_cache_bytes));
        let gateway = Arc::new(TileFetchGateway::new(
            Arc::clone(&provider),
            TileCacheStore::new(cache),
            config.tile_ttl_secs,
        ));

        let job_store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let source: Arc<dyn TileSource> = gateway.clone();
        let jobs = PreprocessJobManager::new(job_store, source, config.preprocess);

        info!(
            provider = provider.name(),
            memory_cache_bytes = config.memory_cache_bytes,
            tile_ttl_secs = config.tile_ttl_secs,
            preprocess_zoom = jobs.settings().zoom,
            max_preprocess_tiles = jobs.settings().max_tiles,
            "AgroTile service assembled"
        );

        Self {
            config,
            gateway,
            jobs,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<TileFetchGateway> {
        &self.gateway
    }

    pub fn jobs(&self) -> &PreprocessJobManager {
        &self.jobs
    }

    /// A fresh router over the shared gateway and job manager.
    pub fn router(&self) -> Router {
        router(ApiState {
            gateway: Arc::clone(&self.gateway),
            jobs: self.jobs.clone(),
        })
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn serve(&self, shutdown: CancellationToken) -> Result<(), AppError> {
        let addr = self.config.bind;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), AppError> {
        let local = listener.local_addr().map_err(AppError::Serve)?;
        info!(addr = %local, "HTTP server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(AppError::Serve)?;

        info!("HTTP server stopped");
        Ok(())
    }
}
