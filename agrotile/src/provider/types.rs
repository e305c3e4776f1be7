//! Provider types and traits

use thiserror::Error;

use crate::cache::BoxFuture;
use crate::coord::GeoBoundingBox;
use crate::tile::ImageryDate;

use super::evalscript::EvalScript;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The request never produced a response (connect failure, timeout,
    /// truncated body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token exchange failed with HTTP {status}")]
    TokenExchange { status: u16 },

    /// The render endpoint answered with a non-2xx status.
    #[error("Render request failed with HTTP {status}")]
    Render { status: u16 },

    /// A 2xx response whose body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Transport failures and 5xx render responses are transient. Token
    /// failures and 4xx responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Render { status } => *status >= 500,
            ProviderError::HttpClient(_)
            | ProviderError::TokenExchange { .. }
            | ProviderError::InvalidResponse(_) => false,
        }
    }
}

/// Everything the provider needs to render one tile.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Tile footprint in EPSG:4326.
    pub bbox: GeoBoundingBox,
    /// Acquisition day; the provider is queried for that UTC day only.
    pub date: ImageryDate,
    /// Band selection script.
    pub script: EvalScript,
}

/// Binary imagery returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Source of rendered satellite imagery.
///
/// Dyn-compatible so the fetch gateway can hold any provider behind an
/// `Arc<dyn ImageryProvider>`.
pub trait ImageryProvider: Send + Sync {
    /// Renders the tile described by `request`.
    fn render<'a>(
        &'a self,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, Result<RenderedImage, ProviderError>>;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Transport("timed out".to_string()).is_retryable());
        assert!(ProviderError::Render { status: 503 }.is_retryable());
        assert!(!ProviderError::Render { status: 400 }.is_retryable());
        assert!(!ProviderError::TokenExchange { status: 500 }.is_retryable());
        assert!(!ProviderError::InvalidResponse("empty".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Render { status: 429 };
        assert_eq!(err.to_string(), "Render request failed with HTTP 429");
    }
}
