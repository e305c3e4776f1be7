//! Conditional tile fetching through the gateway and the full
//! Sentinel Hub provider stack.
//!
//! Run with: `cargo test --test tile_gateway`

mod common;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agrotile::cache::{content_hash, MemoryCacheProvider, TileCacheStore};
use agrotile::gateway::{TileError, TileFetchGateway, TileQuery, TileResponse};
use agrotile::provider::{
    AsyncHttpClient, HttpResponse, ProviderCredentials, ProviderError, ProviderTokenCache,
    SentinelHubProvider,
};
use agrotile::tile::BandSpec;

use common::{gateway, ScriptedProvider, TTL_SECS};

const DATE: &str = "2024-06-01";

// ============================================================================
// Gateway with a scripted provider
// ============================================================================

#[tokio::test]
async fn miss_then_hit_then_not_modified() {
    let provider = Arc::new(ScriptedProvider::new());
    let gateway = gateway(provider.clone());
    let query = TileQuery::new(12, 2956, 1966, DATE);

    let first = gateway.get_tile(&query).await.unwrap();
    assert_eq!(first.status_code(), 200);
    assert!(!first.cache_hit());
    assert_eq!(first.ttl_seconds(), TTL_SECS);
    let payload = first.payload().unwrap().clone();
    assert_eq!(first.validator(), content_hash(&payload));

    let second = gateway.get_tile(&query).await.unwrap();
    assert!(second.cache_hit());
    assert_eq!(second.payload(), Some(&payload));
    assert_eq!(second.validator(), first.validator());

    let conditional = query
        .clone()
        .with_if_none_match(format!("\"{}\"", first.validator()));
    let third = gateway.get_tile(&conditional).await.unwrap();
    assert_eq!(third.status_code(), 304);
    assert!(third.payload().is_none());
    assert_eq!(third.validator(), first.validator());

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn stale_validator_gets_full_payload() {
    let provider = Arc::new(ScriptedProvider::new());
    let gateway = gateway(provider.clone());
    let query = TileQuery::new(10, 700, 400, DATE);

    gateway.get_tile(&query).await.unwrap();
    let response = gateway
        .get_tile(&query.with_if_none_match("\"deadbeef\""))
        .await
        .unwrap();

    assert!(matches!(response, TileResponse::Ok { cache_hit: true, .. }));
}

#[tokio::test]
async fn validator_on_cold_cache_still_renders() {
    let provider = Arc::new(ScriptedProvider::new());
    let gateway = gateway(provider.clone());

    let response = gateway
        .get_tile(&TileQuery::new(8, 100, 100, DATE).with_if_none_match("*"))
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn band_and_cloud_selection_are_separate_cache_entries() {
    let provider = Arc::new(ScriptedProvider::new());
    let gateway = gateway(provider.clone());
    let base = TileQuery::new(12, 2956, 1966, DATE);

    let rgb = gateway.get_tile(&base).await.unwrap();
    let nir = gateway
        .get_tile(&base.clone().with_bands(BandSpec::from_csv("NIR,RED")))
        .await
        .unwrap();
    let cloudy = gateway
        .get_tile(&base.clone().with_cloud_threshold(80))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 3);
    assert_ne!(rgb.validator(), nir.validator());
    assert!(!cloudy.cache_hit());

    // Case and whitespace differences hit the same entry.
    let nir_again = gateway
        .get_tile(&base.with_bands(BandSpec::from_csv(" nir , red")))
        .await
        .unwrap();
    assert!(nir_again.cache_hit());
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn invalid_requests_never_reach_the_provider() {
    let provider = Arc::new(ScriptedProvider::new());
    let gateway = gateway(provider.clone());

    let invalid = [
        TileQuery::new(23, 0, 0, DATE),
        TileQuery::new(3, 8, 0, DATE),
        TileQuery::new(3, 0, 0, "2024-13-01"),
        TileQuery::new(3, 0, 0, "yesterday"),
        TileQuery::new(3, 0, 0, DATE).with_cloud_threshold(101),
    ];
    for query in invalid {
        let err = gateway.get_tile(&query).await.unwrap_err();
        assert!(matches!(err, TileError::InvalidRequest(_)), "{err:?}");
        assert!(!err.is_retryable());
    }

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn provider_failures_are_classified_and_not_cached() {
    let cases = [
        (
            ProviderError::TokenExchange { status: 401 },
            TileError::UpstreamAuth { status: 401 },
            false,
        ),
        (
            ProviderError::Render { status: 503 },
            TileError::UpstreamFetch { status: 503 },
            true,
        ),
        (
            ProviderError::Render { status: 400 },
            TileError::UpstreamFetch { status: 400 },
            false,
        ),
        (
            ProviderError::Transport("timed out".to_string()),
            TileError::UpstreamUnavailable("timed out".to_string()),
            true,
        ),
    ];

    for (provider_error, expected, retryable) in cases {
        let provider = Arc::new(ScriptedProvider::always_failing(provider_error));
        let gateway = gateway(provider.clone());
        let query = TileQuery::new(12, 2956, 1966, DATE);

        let err = gateway.get_tile(&query).await.unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(err.is_retryable(), retryable);

        // Nothing was cached, so the next call goes upstream again.
        gateway.get_tile(&query).await.unwrap_err();
        assert_eq!(provider.calls(), 2);
        assert_eq!(gateway.store().entry_count(), 0);
    }
}

// ============================================================================
// Full provider stack over a fake HTTP transport
// ============================================================================

/// Answers the token endpoint and the process endpoint like Sentinel Hub.
#[derive(Default)]
struct FakeSentinelHttp {
    token_calls: AtomicUsize,
    render_calls: AtomicUsize,
    render_status: Option<u16>,
    bearers: Mutex<Vec<String>>,
    bodies: Mutex<Vec<serde_json::Value>>,
}

impl AsyncHttpClient for FakeSentinelHttp {
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        _timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send {
        assert!(url.ends_with("/oauth/token"));
        assert!(form.contains(&("grant_type", "client_credentials")));
        let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

        async move {
            Ok(HttpResponse {
                status: 200,
                content_type: Some("application/json".to_string()),
                body: format!(r#"{{"access_token":"token-{n}","expires_in":3600}}"#).into_bytes(),
            })
        }
    }

    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        _accept: &str,
        json_body: Vec<u8>,
        _timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send {
        assert!(url.ends_with("/api/v1/process"));
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        self.bearers.lock().unwrap().push(bearer_token.to_string());
        self.bodies
            .lock()
            .unwrap()
            .push(serde_json::from_slice(&json_body).unwrap());
        let status = self.render_status.unwrap_or(200);

        async move {
            Ok(HttpResponse {
                status,
                content_type: Some("image/png".to_string()),
                body: b"\x89PNG-fake".to_vec(),
            })
        }
    }
}

fn sentinel_gateway(http: Arc<FakeSentinelHttp>) -> TileFetchGateway {
    let tokens = ProviderTokenCache::new(
        Arc::clone(&http),
        "https://sh.test/oauth/token",
        ProviderCredentials::new("client", "secret"),
        Duration::from_secs(10),
    );
    let provider = SentinelHubProvider::new(http, tokens, "https://sh.test", Duration::from_secs(15));
    TileFetchGateway::new(
        Arc::new(provider),
        TileCacheStore::new(Arc::new(MemoryCacheProvider::new(1024 * 1024))),
        TTL_SECS,
    )
}

#[tokio::test]
async fn sentinel_stack_reuses_token_and_builds_process_body() {
    let http = Arc::new(FakeSentinelHttp::default());
    let gateway = sentinel_gateway(http.clone());

    let ndvi = TileQuery::new(12, 2956, 1966, DATE).with_bands(BandSpec::from_csv("NIR,RED"));
    let response = gateway.get_tile(&ndvi).await.unwrap();
    assert_eq!(response.mime_type(), "image/png");
    assert_eq!(response.validator(), content_hash(b"\x89PNG-fake"));

    gateway
        .get_tile(&TileQuery::new(12, 2957, 1966, DATE))
        .await
        .unwrap();

    assert_eq!(http.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(http.render_calls.load(Ordering::SeqCst), 2);
    assert_eq!(*http.bearers.lock().unwrap(), vec!["token-1", "token-1"]);

    let bodies = http.bodies.lock().unwrap();
    let body = &bodies[0];
    let data = &body["input"]["data"][0];
    assert_eq!(data["type"], "S2L2A");
    assert_eq!(
        data["dataFilter"]["timeRange"]["from"],
        "2024-06-01T00:00:00Z"
    );
    assert_eq!(
        data["dataFilter"]["timeRange"]["to"],
        "2024-06-01T23:59:59Z"
    );
    assert_eq!(body["output"]["width"], 512);
    assert_eq!(body["output"]["height"], 512);
    let script = body["evalscript"].as_str().unwrap();
    assert!(script.contains("B08") && script.contains("B04"));
}

#[tokio::test]
async fn sentinel_render_failure_maps_to_upstream_error() {
    let http = Arc::new(FakeSentinelHttp {
        render_status: Some(502),
        ..FakeSentinelHttp::default()
    });
    let gateway = sentinel_gateway(http);

    let err = gateway
        .get_tile(&TileQuery::new(12, 2956, 1966, DATE))
        .await
        .unwrap_err();

    assert_eq!(err, TileError::UpstreamFetch { status: 502 });
    assert!(err.is_retryable());
}
