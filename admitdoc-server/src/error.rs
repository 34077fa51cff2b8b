use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use admitdoc_pipeline::PipelineError;
use admitdoc_records::RecordStoreError;

/// Top-level API error shared by all route handlers.
///
/// Every variant maps to a stable machine-readable `code` so retrieval
/// callers can branch without parsing messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("record store error: {0}")]
    RecordStore(#[from] RecordStoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("stored artifact is not a valid document")]
    InvalidArtifact,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::RecordStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(PipelineError::EnqueueFailed(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(PipelineError::RenderFailed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(PipelineError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InvalidArtifact => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SerdeJson(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable error code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RecordStore(_) => "record_store_unavailable",
            ApiError::Pipeline(PipelineError::EnqueueFailed(_)) => "render_failed",
            ApiError::Pipeline(PipelineError::RenderFailed(_)) => "render_failed",
            ApiError::Pipeline(PipelineError::Timeout(_)) => "timeout",
            ApiError::InvalidArtifact => "invalid_artifact",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::SerdeJson(_) => "bad_request",
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = json!({ "error": self.to_string(), "code": self.code() });
        (status, Json(payload)).into_response()
    }
}
