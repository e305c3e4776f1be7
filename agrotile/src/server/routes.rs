//! Satellite API routes.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::coord::MAX_ZOOM;
use crate::gateway::{TileFetchGateway, TileQuery, TileResponse};
use crate::jobs::{PreprocessJobManager, PreprocessRequest, MAX_IDEMPOTENCY_KEY_LEN};
use crate::tile::{BandSpec, ImageryDate, ALLOWED_BANDS, DEFAULT_CLOUD_THRESHOLD, MAX_CLOUD_THRESHOLD};

use super::error::ApiError;

/// Mount point of the satellite API.
pub const API_PREFIX: &str = "/api/v1/satellite";

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<TileFetchGateway>,
    pub jobs: PreprocessJobManager,
}

/// Builds the satellite router, nested under [`API_PREFIX`].
pub fn router(state: ApiState) -> Router {
    let satellite = Router::new()
        .route("/tiles/:z/:x/:y", get(get_tile))
        .route("/preprocess", post(submit_preprocess))
        .route("/preprocess/:job_id", get(get_preprocess_status));

    Router::new()
        .nest(API_PREFIX, satellite)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Correlation id from `X-Correlation-Id`, falling back to `X-Request-Id`.
pub fn correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-correlation-id")
        .or_else(|| headers.get("x-request-id"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = request.uri().path().to_string();
    let correlation = correlation_id(request.headers()).unwrap_or_default();

    let response = next.run(request).await;

    info!(
        correlation_id = %correlation,
        method = %method,
        route = %route,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );
    response
}

fn success(status: StatusCode, data: impl Serialize) -> Response {
    (
        status,
        Json(json!({
            "success": true,
            "data": data,
            "meta": { "timestamp": Utc::now().to_rfc3339() },
        })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TileParams {
    pub date: Option<String>,
    pub bands: Option<String>,
    pub cloud_lt: Option<String>,
}

fn parse_index<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|_| ApiError::Validation(format!("{} must be a non-negative integer", name)))
}

/// Band list from a query string, rejecting names outside the allowed set.
fn parse_band_csv(raw: &str) -> Result<BandSpec, ApiError> {
    let parts: Vec<String> = raw
        .split(',')
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(ApiError::Validation("bands cannot be empty".to_string()));
    }
    validate_bands(BandSpec::from_list(parts))
}

fn validate_bands(bands: BandSpec) -> Result<BandSpec, ApiError> {
    match bands.first_unsupported() {
        Some(band) => Err(ApiError::Validation(format!(
            "Invalid band '{}'. Allowed: {}",
            band,
            ALLOWED_BANDS.join(", ")
        ))),
        None => Ok(bands),
    }
}

fn tile_query(
    (z, x, y): (String, String, String),
    params: TileParams,
    headers: &HeaderMap,
) -> Result<TileQuery, ApiError> {
    let z: u8 = parse_index("z", &z)?;
    if z > MAX_ZOOM {
        return Err(ApiError::Validation(format!("z must be between 0 and {}", MAX_ZOOM)));
    }
    let x: u32 = parse_index("x", &x)?;
    let y: u32 = parse_index("y", &y)?;

    let date = params
        .date
        .ok_or_else(|| ApiError::Validation("date is required".to_string()))?;
    ImageryDate::parse(&date).map_err(|e| ApiError::Validation(e.to_string()))?;

    let bands = match params.bands.as_deref() {
        Some(raw) => parse_band_csv(raw)?,
        None => BandSpec::rgb(),
    };

    let cloud_threshold = match params.cloud_lt.as_deref() {
        Some(raw) => raw
            .parse::<u8>()
            .ok()
            .filter(|c| *c <= MAX_CLOUD_THRESHOLD)
            .ok_or_else(|| {
                ApiError::Validation("cloud_lt must be an integer between 0 and 100".to_string())
            })?,
        None => DEFAULT_CLOUD_THRESHOLD,
    };

    let mut query = TileQuery::new(z, x, y, date)
        .with_bands(bands)
        .with_cloud_threshold(cloud_threshold);
    if let Some(inm) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    {
        query = query.with_if_none_match(inm);
    }
    Ok(query)
}

fn tile_response(response: TileResponse) -> Result<Response, ApiError> {
    let header_value = |value: String| {
        HeaderValue::from_str(&value).map_err(|e| ApiError::Internal(e.to_string()))
    };

    let cache_control = header_value(format!("public, max-age={}", response.ttl_seconds()))?;
    let etag = header_value(format!("\"{}\"", response.validator()))?;
    let content_type = header_value(response.mime_type().to_string())?;

    let headers = [
        (header::CACHE_CONTROL, cache_control),
        (header::ETAG, etag),
        (header::CONTENT_TYPE, content_type),
    ];

    Ok(match response {
        TileResponse::Ok { payload, .. } => (StatusCode::OK, headers, payload).into_response(),
        TileResponse::NotModified { .. } => (StatusCode::NOT_MODIFIED, headers).into_response(),
    })
}

async fn get_tile(
    State(state): State<ApiState>,
    Path(path): Path<(String, String, String)>,
    Query(params): Query<TileParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let query = tile_query(path, params, &headers)?;
    let response = state.gateway.get_tile(&query).await?;

    info!(
        correlation_id = %correlation_id(&headers).unwrap_or_default(),
        z = query.z,
        x = query.x,
        y = query.y,
        status = response.status_code(),
        cache_hit = response.cache_hit(),
        etag = %response.validator(),
        "Satellite tile"
    );

    tile_response(response)
}

// ---------------------------------------------------------------------------
// Preprocess
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PreprocessBody {
    pub bbox: Vec<f64>,
    pub date: String,
    #[serde(default)]
    pub bands: Option<Vec<String>>,
    #[serde(default)]
    pub cloud_mask: bool,
    #[serde(default, rename = "idempotencyKey")]
    pub idempotency_key: Option<String>,
}

fn preprocess_request(body: PreprocessBody) -> Result<PreprocessRequest, ApiError> {
    let bbox: [f64; 4] = body.bbox.try_into().map_err(|_| {
        ApiError::Validation("bbox must be [minLon,minLat,maxLon,maxLat]".to_string())
    })?;

    let bands = match body.bands {
        Some(list) if list.is_empty() => BandSpec::rgb(),
        Some(list) => validate_bands(BandSpec::from_list(list))?,
        None => BandSpec::rgb(),
    };

    Ok(PreprocessRequest {
        bbox,
        date: body.date,
        bands,
        cloud_mask: body.cloud_mask,
    })
}

async fn submit_preprocess(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<PreprocessBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| body.idempotency_key.clone())
        .filter(|k| !k.is_empty());
    if idempotency_key
        .as_ref()
        .is_some_and(|k| k.chars().count() > MAX_IDEMPOTENCY_KEY_LEN)
    {
        return Err(ApiError::Validation(format!(
            "idempotencyKey must be at most {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }

    let request = preprocess_request(body)?;
    let submitted = state.jobs.submit(request, idempotency_key.as_deref())?;

    info!(
        correlation_id = %correlation_id(&headers).unwrap_or_default(),
        job_id = %submitted.job_id,
        status = %submitted.status,
        "Preprocess submitted"
    );

    Ok(success(StatusCode::ACCEPTED, submitted))
}

async fn get_preprocess_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = Uuid::parse_str(&job_id)
        .ok()
        .and_then(|id| state.jobs.get_job(&id))
        .ok_or(ApiError::NotFound("Job not found"))?;

    Ok(success(StatusCode::OK, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(z: &str, x: &str, y: &str) -> (String, String, String) {
        (z.to_string(), x.to_string(), y.to_string())
    }

    fn params(date: Option<&str>, bands: Option<&str>, cloud: Option<&str>) -> TileParams {
        TileParams {
            date: date.map(str::to_string),
            bands: bands.map(str::to_string),
            cloud_lt: cloud.map(str::to_string),
        }
    }

    #[test]
    fn test_tile_query_defaults() {
        let query = tile_query(
            path("12", "2954", "1969"),
            params(Some("2024-06-01"), None, None),
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(query.bands, BandSpec::rgb());
        assert_eq!(query.cloud_threshold, 20);
        assert!(query.if_none_match.is_none());
    }

    #[test]
    fn test_tile_query_reads_if_none_match() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        let query = tile_query(
            path("1", "0", "0"),
            params(Some("2024-06-01"), Some("nir,red"), Some("35")),
            &headers,
        )
        .unwrap();
        assert_eq!(query.if_none_match.as_deref(), Some("\"abc\""));
        assert_eq!(query.bands.to_csv(), "NIR,RED");
        assert_eq!(query.cloud_threshold, 35);
    }

    #[test]
    fn test_tile_query_validation() {
        let bad = [
            (path("23", "0", "0"), params(Some("2024-06-01"), None, None)),
            (path("-1", "0", "0"), params(Some("2024-06-01"), None, None)),
            (path("1", "a", "0"), params(Some("2024-06-01"), None, None)),
            (path("1", "0", "0"), params(None, None, None)),
            (path("1", "0", "0"), params(Some("2024-6-1"), None, None)),
            (path("1", "0", "0"), params(Some("2024-06-01"), Some("B12"), None)),
            (path("1", "0", "0"), params(Some("2024-06-01"), Some(" , "), None)),
            (path("1", "0", "0"), params(Some("2024-06-01"), None, Some("101"))),
            (path("1", "0", "0"), params(Some("2024-06-01"), None, Some("-5"))),
        ];
        for (p, q) in bad {
            assert!(
                matches!(tile_query(p, q, &HeaderMap::new()), Err(ApiError::Validation(_))),
                "expected validation error"
            );
        }
    }

    #[test]
    fn test_preprocess_request_conversion() {
        let body = PreprocessBody {
            bbox: vec![79.8, 6.9, 80.2, 7.2],
            date: "2024-06-01".to_string(),
            bands: Some(vec!["nir".to_string()]),
            cloud_mask: true,
            idempotency_key: None,
        };
        let request = preprocess_request(body).unwrap();
        assert_eq!(request.bbox, [79.8, 6.9, 80.2, 7.2]);
        assert_eq!(request.bands.to_csv(), "NIR");
        assert!(request.cloud_mask);
    }

    #[test]
    fn test_preprocess_request_rejects_short_bbox() {
        let body = PreprocessBody {
            bbox: vec![79.8, 6.9, 80.2],
            date: "2024-06-01".to_string(),
            bands: None,
            cloud_mask: false,
            idempotency_key: None,
        };
        assert!(matches!(preprocess_request(body), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_correlation_id_fallback() {
        let mut headers = HeaderMap::new();
        assert_eq!(correlation_id(&headers), None);
        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        assert_eq!(correlation_id(&headers).as_deref(), Some("req-1"));
        headers.insert("x-correlation-id", HeaderValue::from_static("corr-1"));
        assert_eq!(correlation_id(&headers).as_deref(), Some("corr-1"));
    }
}
