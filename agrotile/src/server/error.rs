//! HTTP error envelope and status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use crate::gateway::TileError;
use crate::jobs::JobError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("{0}")]
    Internal(String),
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidRequest(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Builds a failure envelope:
/// `{success:false, error:{code,message[,retryable]}, meta:{timestamp}}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    retryable: Option<bool>,
) -> Response {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(retryable) = retryable {
        error["retryable"] = json!(retryable);
    }

    (
        status,
        Json(json!({
            "success": false,
            "error": error,
            "meta": { "timestamp": Utc::now().to_rfc3339() },
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => {
                json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Internal(msg) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None)
            }
            ApiError::Tile(err) => {
                let retryable = err.is_retryable();
                match err {
                    TileError::InvalidRequest(msg) => {
                        json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
                    }
                    TileError::UpstreamAuth { .. } => json_error(
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_AUTH_ERROR",
                        err.to_string(),
                        Some(retryable),
                    ),
                    TileError::UpstreamFetch { .. } | TileError::UpstreamResponse(_) => json_error(
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        err.to_string(),
                        Some(retryable),
                    ),
                    TileError::UpstreamUnavailable(_) => json_error(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "UPSTREAM_UNAVAILABLE",
                        err.to_string(),
                        Some(retryable),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("Job not found"), StatusCode::NOT_FOUND),
            (
                ApiError::Tile(TileError::UpstreamAuth { status: 401 }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Tile(TileError::UpstreamFetch { status: 500 }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Tile(TileError::UpstreamUnavailable("timeout".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Tile(TileError::InvalidRequest("zoom".to_string())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_job_error_conversion() {
        assert!(matches!(
            ApiError::from(JobError::InvalidRequest("x".to_string())),
            ApiError::Validation(_)
        ));
    }
}
