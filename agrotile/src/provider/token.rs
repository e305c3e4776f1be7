//! OAuth client-credentials token cache.
//!
//! The render API authenticates with a short-lived bearer token obtained
//! from the token endpoint. One token is held per process and refreshed
//! once it is within [`REFRESH_MARGIN`] of expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::http::AsyncHttpClient;
use super::types::ProviderError;

/// Tokens this close to expiry are treated as stale.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Shortest lifetime honored, even if the endpoint reports less.
pub const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(30);

/// Longest lifetime honored; larger `expires_in` values are clamped.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);

/// Client credentials for the token endpoint.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ProviderCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// True when either half of the credential pair is empty.
    pub fn is_incomplete(&self) -> bool {
        self.client_id.is_empty() || self.client_secret.is_empty()
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// A bearer token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    /// Whether the token can still be used at `now`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.expires_at
            .checked_duration_since(now)
            .is_some_and(|remaining| remaining > REFRESH_MARGIN)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Caches the provider access token and refreshes it on demand.
///
/// Concurrent callers that observe a stale token may each perform an
/// exchange; the last one to finish wins. Both tokens are valid, so this
/// only costs an extra round trip.
pub struct ProviderTokenCache<C: AsyncHttpClient> {
    client: Arc<C>,
    token_url: String,
    credentials: ProviderCredentials,
    timeout: Duration,
    current: RwLock<Option<AccessToken>>,
}

impl<C: AsyncHttpClient> ProviderTokenCache<C> {
    pub fn new(
        client: Arc<C>,
        token_url: impl Into<String>,
        credentials: ProviderCredentials,
        timeout: Duration,
    ) -> Self {
        if credentials.is_incomplete() {
            warn!("Provider client credentials are not configured; token exchange will fail");
        }
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            timeout,
            current: RwLock::new(None),
        }
    }

    /// Returns a valid bearer token, exchanging credentials if needed.
    pub async fn get_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.cached_at(Instant::now()) {
            return Ok(token);
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *self.current.write() = Some(token);
        Ok(value)
    }

    /// Seeds the cache with a known token.
    pub fn set_token(&self, token: AccessToken) {
        *self.current.write() = Some(token);
    }

    /// Drops the cached token so the next call re-authenticates.
    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    fn cached_at(&self, now: Instant) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .filter(|token| token.is_fresh_at(now))
            .map(|token| token.value.clone())
    }

    async fn exchange(&self) -> Result<AccessToken, ProviderError> {
        debug!(url = %self.token_url, "Requesting provider access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let response = self
            .client
            .post_form(&self.token_url, &form, self.timeout)
            .await?;

        if !response.is_success() {
            warn!(status = response.status, "Provider token exchange rejected");
            return Err(ProviderError::TokenExchange {
                status: response.status,
            });
        }

        let parsed: TokenResponse = serde_json::from_slice(&response.body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Malformed token response: {}", e))
        })?;

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Token response has no access_token".to_string())
            })?;

        let lifetime = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME)
            .clamp(MIN_TOKEN_LIFETIME, MAX_TOKEN_LIFETIME);

        let expires_at = Instant::now().checked_add(lifetime).ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "Token lifetime of {}s is out of range",
                lifetime.as_secs()
            ))
        })?;

        info!(lifetime_secs = lifetime.as_secs(), "Provider access token refreshed");

        Ok(AccessToken { value, expires_at })
    }
}
