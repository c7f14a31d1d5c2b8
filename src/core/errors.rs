use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the retrieval pipeline itself.
///
/// Input/configuration errors (`DimensionMismatch`, `EmptyIndex`, `InvalidK`)
/// are reported immediately. External-dependency errors (`EmbeddingUnavailable`,
/// `GenerationFailed`) abort the whole query. Per-candidate grading failures
/// never appear here; the grader contains them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RagError {
    #[error("vector dimension mismatch: index holds {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("no log entries have been indexed yet")]
    EmptyIndex,
    #[error("invalid k: {0} (must be at least 1)")]
    InvalidK(usize),
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("answer generation failed: {0}")]
    GenerationFailed(String),
}

/// Failure of an external embedding or LLM collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmptyIndex => ApiError::BadRequest(
                "No logs have been ingested yet. Upload a CSV log file first.".to_string(),
            ),
            RagError::InvalidK(_) => ApiError::BadRequest(err.to_string()),
            RagError::EmbeddingUnavailable(_) | RagError::GenerationFailed(_) => {
                ApiError::Upstream(err.to_string())
            }
            RagError::DimensionMismatch { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
