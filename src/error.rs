use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

// Bad limiter inputs, rejected before they reach the store
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("invalid rate limit config: {0}")]
    InvalidConfig(String),
    #[error("invalid rate limit key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{message} (retry after {retry_after_secs}s)")]
pub struct RateLimitExceeded {
    pub message: String,
    pub retry_after_secs: u64,
    pub reset_time: u64,
}

#[derive(Debug)]
pub enum AppError {
    Exceeded(RateLimitExceeded),
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Exceeded(exceeded) => {
                let body = ErrorBody {
                    success: false,
                    error: exceeded.message,
                    reset_time: Some(exceeded.reset_time),
                    retry_after: Some(exceeded.retry_after_secs),
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from(exceeded.retry_after_secs),
                );
                response
            }
            AppError::BadRequest(msg) => plain(StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                // real cause stays in the server log
                tracing::error!("Internal error: {}", msg);
                plain(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

fn plain(status: StatusCode, error: String) -> Response {
    let body = ErrorBody {
        success: false,
        error,
        reset_time: None,
        retry_after: None,
    };
    (status, Json(body)).into_response()
}

impl From<RateLimitExceeded> for AppError {
    fn from(e: RateLimitExceeded) -> Self {
        AppError::Exceeded(e)
    }
}

impl From<RateLimitError> for AppError {
    fn from(e: RateLimitError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

// malformed or mistyped bodies get the same 400 shape as other bad input
impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", e))
    }
}
