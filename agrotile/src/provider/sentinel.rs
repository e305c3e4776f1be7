//! Sentinel Hub process API provider.
//!
//! Renders Sentinel-2 L2A imagery for one bounding box and one UTC day.
//! Each render call obtains a bearer token from [`ProviderTokenCache`] and
//! POSTs a JSON process request to `{base_url}/api/v1/process`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::BoxFuture;

use super::http::AsyncHttpClient;
use super::token::ProviderTokenCache;
use super::types::{ImageryProvider, ProviderError, RenderRequest, RenderedImage};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://services.sentinel-hub.com";

/// Path of the token endpoint relative to the base URL.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Path of the render endpoint relative to the base URL.
pub const PROCESS_PATH: &str = "/api/v1/process";

/// Collection identifier for Sentinel-2 surface reflectance.
pub const DATA_SOURCE: &str = "S2L2A";

/// Rendered tile edge in pixels.
pub const OUTPUT_SIZE: u32 = 512;

/// Format requested from, and assumed for, the render endpoint.
pub const OUTPUT_FORMAT: &str = "image/png";

const CRS_WGS84: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    input: ProcessInput<'a>,
    output: ProcessOutput<'a>,
    evalscript: &'a str,
}

#[derive(Debug, Serialize)]
struct ProcessInput<'a> {
    bounds: Bounds<'a>,
    data: [DataSource<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Bounds<'a> {
    bbox: [f64; 4],
    properties: CrsProperties<'a>,
}

#[derive(Debug, Serialize)]
struct CrsProperties<'a> {
    crs: &'a str,
}

#[derive(Debug, Serialize)]
struct DataSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(rename = "dataFilter")]
    data_filter: DataFilter,
}

#[derive(Debug, Serialize)]
struct DataFilter {
    #[serde(rename = "timeRange")]
    time_range: TimeRange,
}

#[derive(Debug, Serialize)]
struct TimeRange {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct ProcessOutput<'a> {
    width: u32,
    height: u32,
    responses: [OutputResponse<'a>; 1],
}

#[derive(Debug, Serialize)]
struct OutputResponse<'a> {
    identifier: &'a str,
    format: OutputFormat<'a>,
}

#[derive(Debug, Serialize)]
struct OutputFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Serializes the process API body for `request`.
pub fn build_process_body(request: &RenderRequest) -> Result<Vec<u8>, ProviderError> {
    let body = ProcessRequest {
        input: ProcessInput {
            bounds: Bounds {
                bbox: request.bbox.to_array(),
                properties: CrsProperties { crs: CRS_WGS84 },
            },
            data: [DataSource {
                kind: DATA_SOURCE,
                data_filter: DataFilter {
                    time_range: TimeRange {
                        from: request.date.start_of_day(),
                        to: request.date.end_of_day(),
                    },
                },
            }],
        },
        output: ProcessOutput {
            width: OUTPUT_SIZE,
            height: OUTPUT_SIZE,
            responses: [OutputResponse {
                identifier: "default",
                format: OutputFormat {
                    kind: OUTPUT_FORMAT,
                },
            }],
        },
        evalscript: request.script.as_str(),
    };

    serde_json::to_vec(&body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to encode request: {}", e)))
}

/// Sentinel Hub imagery provider.
pub struct SentinelHubProvider<C: AsyncHttpClient> {
    client: Arc<C>,
    tokens: ProviderTokenCache<C>,
    process_url: String,
    fetch_timeout: Duration,
}

impl<C: AsyncHttpClient> SentinelHubProvider<C> {
    /// Creates a provider rendering through `{base_url}/api/v1/process`.
    pub fn new(
        client: Arc<C>,
        tokens: ProviderTokenCache<C>,
        base_url: &str,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            client,
            tokens,
            process_url: format!("{}{}", base_url.trim_end_matches('/'), PROCESS_PATH),
            fetch_timeout,
        }
    }

    /// Token cache used for authentication.
    pub fn tokens(&self) -> &ProviderTokenCache<C> {
        &self.tokens
    }

    /// Renders one tile.
    pub async fn render_tile(&self, request: &RenderRequest) -> Result<RenderedImage, ProviderError> {
        let token = self.tokens.get_token().await?;
        let body = build_process_body(request)?;

        debug!(
            bbox = ?request.bbox.to_array(),
            date = %request.date,
            bands = ?request.script.input_bands(),
            "Rendering tile"
        );

        let response = self
            .client
            .post_json(&self.process_url, &token, OUTPUT_FORMAT, body, self.fetch_timeout)
            .await?;

        if !response.is_success() {
            warn!(status = response.status, "Provider render request failed");
            return Err(ProviderError::Render {
                status: response.status,
            });
        }

        if response.body.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Render response has an empty body".to_string(),
            ));
        }

        Ok(RenderedImage {
            bytes: response.body,
            content_type: response
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| OUTPUT_FORMAT.to_string()),
        })
    }
}

impl<C: AsyncHttpClient + 'static> ImageryProvider for SentinelHubProvider<C> {
    fn render<'a>(
        &'a self,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, Result<RenderedImage, ProviderError>> {
        Box::pin(self.render_tile(request))
    }

    fn name(&self) -> &str {
        "SentinelHub"
    }
}
