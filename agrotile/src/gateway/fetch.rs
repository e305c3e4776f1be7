//! Tile fetch gateway: cache check, provider render, cache populate.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, warn};

use crate::cache::{BoxFuture, TileCacheStore};
use crate::coord::{tile_to_bbox, TileCoordinate};
use crate::provider::{EvalScriptBuilder, ImageryProvider, RenderRequest};
use crate::tile::{ImageryDate, TileRequestKey, MAX_CLOUD_THRESHOLD};

use super::types::{TileError, TileQuery, TileResponse, TileSource};

/// Default cache lifetime for rendered tiles (6 hours).
pub const DEFAULT_TILE_TTL_SECS: u64 = 6 * 60 * 60;

/// Strips an optional weak prefix and surrounding quotes from one
/// entity tag.
fn normalize_validator(raw: &str) -> &str {
    let tag = raw.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.trim_matches('"')
}

/// Whether an `If-None-Match` header value matches `validator`.
///
/// Accepts a comma-separated list of tags and the `*` wildcard.
pub fn validator_matches(if_none_match: &str, validator: &str) -> bool {
    if_none_match.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_validator(candidate) == validator
    })
}

/// Satisfies single tile requests against the cache and the provider.
///
/// Concurrent calls for distinct keys are independent. Concurrent misses
/// for the same key each render and the last write wins.
#[derive(Clone)]
pub struct TileFetchGateway {
    provider: Arc<dyn ImageryProvider>,
    store: TileCacheStore,
    ttl_seconds: u64,
}

impl TileFetchGateway {
    pub fn new(provider: Arc<dyn ImageryProvider>, store: TileCacheStore, ttl_seconds: u64) -> Self {
        Self {
            provider,
            store,
            ttl_seconds,
        }
    }

    /// TTL applied to rendered tiles.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Underlying tile store.
    pub fn store(&self) -> &TileCacheStore {
        &self.store
    }

    /// Serves one tile.
    pub async fn get_tile(&self, query: &TileQuery) -> Result<TileResponse, TileError> {
        let start = Instant::now();
        let result = self.resolve(query).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => info!(
                z = query.z,
                x = query.x,
                y = query.y,
                date = %query.date,
                status = response.status_code(),
                cache_hit = response.cache_hit(),
                etag = %response.validator(),
                latency_ms = latency_ms,
                "Tile served"
            ),
            Err(TileError::InvalidRequest(reason)) => warn!(
                z = query.z,
                x = query.x,
                y = query.y,
                reason = %reason,
                "Tile request rejected"
            ),
            Err(e) => warn!(
                z = query.z,
                x = query.x,
                y = query.y,
                provider = self.provider.name(),
                error = %e,
                retryable = e.is_retryable(),
                latency_ms = latency_ms,
                "Tile fetch failed"
            ),
        }

        result
    }

    async fn resolve(&self, query: &TileQuery) -> Result<TileResponse, TileError> {
        let date = ImageryDate::parse(&query.date)?;
        let coordinate = TileCoordinate::new(query.z, query.x, query.y)?;
        if query.cloud_threshold > MAX_CLOUD_THRESHOLD {
            return Err(TileError::InvalidRequest(format!(
                "cloud threshold must be 0..={}, got {}",
                MAX_CLOUD_THRESHOLD, query.cloud_threshold
            )));
        }
        let bbox = tile_to_bbox(coordinate.z, coordinate.x, coordinate.y)?;

        let request_key = TileRequestKey::new(coordinate, date, query.bands.clone())
            .with_cloud_threshold(query.cloud_threshold);
        let key = TileCacheStore::key(&request_key);

        if let Some(cached) = self.store.get(&key).await {
            let matches = query
                .if_none_match
                .as_deref()
                .is_some_and(|inm| validator_matches(inm, &cached.content_hash));

            if matches {
                return Ok(TileResponse::NotModified {
                    mime_type: cached.mime_type,
                    validator: cached.content_hash,
                    ttl_seconds: self.ttl_seconds,
                });
            }

            return Ok(TileResponse::Ok {
                payload: Bytes::from(cached.payload),
                mime_type: cached.mime_type,
                validator: cached.content_hash,
                cache_hit: true,
                ttl_seconds: self.ttl_seconds,
            });
        }

        let render = RenderRequest {
            bbox,
            date,
            script: EvalScriptBuilder::build(&request_key.bands),
        };
        let image = self.provider.render(&render).await?;

        let stored = self
            .store
            .put(&key, image.bytes, &image.content_type, self.ttl_seconds)
            .await;

        Ok(TileResponse::Ok {
            payload: Bytes::from(stored.payload),
            mime_type: stored.mime_type,
            validator: stored.content_hash,
            cache_hit: false,
            ttl_seconds: self.ttl_seconds,
        })
    }
}

impl TileSource for TileFetchGateway {
    fn fetch_tile(&self, query: TileQuery) -> BoxFuture<'_, Result<TileResponse, TileError>> {
        Box::pin(async move { self.get_tile(&query).await })
    }
}
