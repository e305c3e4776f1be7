//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::types::ProviderError;

/// Default User-Agent string for outbound requests.
const DEFAULT_USER_AGENT: &str = concat!("agrotile/", env!("CARGO_PKG_VERSION"));

/// Raw HTTP response.
///
/// Non-2xx statuses are returned as values, not errors, so callers can
/// classify them (auth failure vs. retryable upstream failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests. Every call carries its own
/// timeout budget.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs a form-encoded POST.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `form` - Form fields as (name, value) pairs
    /// * `timeout` - Budget for the whole request
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;

    /// Performs a JSON POST with Bearer token authentication.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `bearer_token` - The bearer token for the Authorization header
    /// * `accept` - Value of the Accept header
    /// * `json_body` - Serialized JSON body
    /// * `timeout` - Budget for the whole request
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        accept: &str,
        json_body: Vec<u8>,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpClient(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn into_response(
        url: &str,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<HttpResponse, ProviderError> {
        let response = match result {
            Ok(resp) => {
                debug!(url = url, status = resp.status().as_u16(), "HTTP response received");
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ProviderError::Transport(format!("Request failed: {}", e)));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(HttpResponse {
                    status,
                    content_type,
                    body: bytes.to_vec(),
                })
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(ProviderError::Transport(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, ProviderError> {
        trace!(url = url, "HTTP form POST starting");
        let result = self
            .client
            .post(url)
            .form(form)
            .timeout(timeout)
            .send()
            .await;
        Self::into_response(url, result).await
    }

    async fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        accept: &str,
        json_body: Vec<u8>,
        timeout: Duration,
    ) -> Result<HttpResponse, ProviderError> {
        trace!(url = url, bytes = json_body.len(), "HTTP JSON POST starting");
        let result = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .timeout(timeout)
            .send()
            .await;
        Self::into_response(url, result).await
    }
}
