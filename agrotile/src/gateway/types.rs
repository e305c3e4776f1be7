//! Gateway request, response and error types.

use bytes::Bytes;
use thiserror::Error;

use crate::cache::BoxFuture;
use crate::coord::CoordError;
use crate::provider::ProviderError;
use crate::tile::{BandSpec, InvalidDate, DEFAULT_CLOUD_THRESHOLD};

/// One tile request as received from a caller.
///
/// `date` is kept as the raw string so the gateway owns its validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileQuery {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub date: String,
    pub bands: BandSpec,
    pub cloud_threshold: u8,
    /// Raw `If-None-Match` value, if the caller sent one.
    pub if_none_match: Option<String>,
}

impl TileQuery {
    /// Query for an RGB tile with the default cloud threshold.
    pub fn new(z: u8, x: u32, y: u32, date: impl Into<String>) -> Self {
        Self {
            z,
            x,
            y,
            date: date.into(),
            bands: BandSpec::rgb(),
            cloud_threshold: DEFAULT_CLOUD_THRESHOLD,
            if_none_match: None,
        }
    }

    pub fn with_bands(mut self, bands: BandSpec) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_cloud_threshold(mut self, cloud_threshold: u8) -> Self {
        self.cloud_threshold = cloud_threshold;
        self
    }

    pub fn with_if_none_match(mut self, validator: impl Into<String>) -> Self {
        self.if_none_match = Some(validator.into());
        self
    }
}

/// Result of a tile fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileResponse {
    /// Full payload, either from cache or freshly rendered.
    Ok {
        payload: Bytes,
        mime_type: String,
        validator: String,
        cache_hit: bool,
        ttl_seconds: u64,
    },
    /// The caller's validator matches the cached tile; no payload.
    NotModified {
        mime_type: String,
        validator: String,
        ttl_seconds: u64,
    },
}

impl TileResponse {
    /// HTTP status code equivalent (200 or 304).
    pub fn status_code(&self) -> u16 {
        match self {
            TileResponse::Ok { .. } => 200,
            TileResponse::NotModified { .. } => 304,
        }
    }

    /// Content hash of the tile.
    pub fn validator(&self) -> &str {
        match self {
            TileResponse::Ok { validator, .. } | TileResponse::NotModified { validator, .. } => {
                validator
            }
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            TileResponse::Ok { mime_type, .. } | TileResponse::NotModified { mime_type, .. } => {
                mime_type
            }
        }
    }

    /// Lifetime to advertise in `Cache-Control`.
    pub fn ttl_seconds(&self) -> u64 {
        match self {
            TileResponse::Ok { ttl_seconds, .. }
            | TileResponse::NotModified { ttl_seconds, .. } => *ttl_seconds,
        }
    }

    /// Whether the tile was served from cache. Always true for 304.
    pub fn cache_hit(&self) -> bool {
        match self {
            TileResponse::Ok { cache_hit, .. } => *cache_hit,
            TileResponse::NotModified { .. } => true,
        }
    }

    /// The payload, absent for 304.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            TileResponse::Ok { payload, .. } => Some(payload),
            TileResponse::NotModified { .. } => None,
        }
    }
}

/// Tile fetch failures, classified for callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    /// Malformed date, out-of-range tile or threshold. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The provider token exchange failed.
    #[error("Upstream authentication failed with HTTP {status}")]
    UpstreamAuth { status: u16 },

    /// The provider answered the render call with a non-2xx status.
    #[error("Upstream render failed with HTTP {status}")]
    UpstreamFetch { status: u16 },

    /// The provider answered 2xx with a body that cannot be used.
    #[error("Upstream returned an unusable response: {0}")]
    UpstreamResponse(String),

    /// The provider could not be reached (transport failure or timeout).
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl TileError {
    /// Whether the caller may retry later.
    pub fn is_retryable(&self) -> bool {
        match self {
            TileError::UpstreamFetch { status } => *status >= 500,
            TileError::UpstreamUnavailable(_) => true,
            TileError::InvalidRequest(_)
            | TileError::UpstreamAuth { .. }
            | TileError::UpstreamResponse(_) => false,
        }
    }
}

impl From<CoordError> for TileError {
    fn from(err: CoordError) -> Self {
        TileError::InvalidRequest(err.to_string())
    }
}

impl From<InvalidDate> for TileError {
    fn from(err: InvalidDate) -> Self {
        TileError::InvalidRequest(err.to_string())
    }
}

impl From<ProviderError> for TileError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::TokenExchange { status } => TileError::UpstreamAuth { status },
            ProviderError::Render { status } => TileError::UpstreamFetch { status },
            ProviderError::InvalidResponse(msg) => TileError::UpstreamResponse(msg),
            ProviderError::Transport(msg) | ProviderError::HttpClient(msg) => {
                TileError::UpstreamUnavailable(msg)
            }
        }
    }
}

/// Anything that can satisfy a tile query.
///
/// The job manager warms the cache through this seam, so tests can drive
/// jobs without a provider.
pub trait TileSource: Send + Sync {
    fn fetch_tile(&self, query: TileQuery) -> BoxFuture<'_, Result<TileResponse, TileError>>;
}
