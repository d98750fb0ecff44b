//! Central error type for the REST surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use store::StoreError;
use thiserror::Error;
use types::errors::StateError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No `X-API-Key` header on a gated endpoint
    #[error("missing API key")]
    MissingApiKey,

    /// Wrong `X-API-Key` value
    #[error("invalid API key")]
    InvalidApiKey,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Missing key is a malformed request; a wrong key is an
            // authorization failure
            ApiError::MissingApiKey => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_API_KEY",
                self.to_string(),
            ),
            ApiError::InvalidApiKey => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone()),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "CONFLICT", message.clone()),
            ApiError::Internal(error) => {
                tracing::error!(error = %error, "internal error on REST surface");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            StoreError::Duplicate { .. } | StoreError::Conflict { .. } => {
                ApiError::Conflict(error.to_string())
            }
        }
    }
}

impl From<StateError> for ApiError {
    fn from(error: StateError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<orchestrator::RoundError> for ApiError {
    fn from(error: orchestrator::RoundError) -> Self {
        match error {
            orchestrator::RoundError::Store(store_error) => store_error.into(),
        }
    }
}
