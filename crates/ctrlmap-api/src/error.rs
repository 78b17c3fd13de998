//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps loader, threshold, embedding and engine errors to HTTP status codes
//! with a JSON body carrying an error code, message, and optional details.
//! Internal error messages are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ctrlmap_core::{CtrlmapError, EmbeddingError, SchemaError, ThresholdError};
use ctrlmap_loader::LoadError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Analysis or record not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Control table or thresholds rejected (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Embedding backend failed or timed out (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A collaborator the request needs is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::warn!(error = %self, "upstream failure"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ThresholdError> for AppError {
    fn from(err: ThresholdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Config(_) => Self::Internal(err.to_string()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

/// Row data arrives as JSON, so every loader failure is the caller's.
impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CtrlmapError> for AppError {
    fn from(err: CtrlmapError) -> Self {
        match err {
            CtrlmapError::Schema(e) => e.into(),
            CtrlmapError::Threshold(e) => e.into(),
            CtrlmapError::Embedding(e) => e.into(),
            CtrlmapError::UnknownControl(id) => Self::NotFound(format!("control {id}")),
            other @ CtrlmapError::MatrixShape { .. } => Self::Internal(other.to_string()),
        }
    }
}
