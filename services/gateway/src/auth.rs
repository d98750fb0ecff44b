//! Shared-secret gate for mutating and admin endpoints
//!
//! Reads are open; anything that changes state requires the `X-API-Key`
//! header. A missing header is a malformed request (422); a wrong key is
//! an authorization failure (401).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum::http::HeaderMap;

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Extractor that admits the request only with the correct shared
/// secret.
pub struct RequireApiKey;

pub fn check_api_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let value = headers.get(API_KEY_HEADER).ok_or(ApiError::MissingApiKey)?;
    let presented = value.to_str().map_err(|_| ApiError::InvalidApiKey)?;
    if presented == expected {
        Ok(())
    } else {
        Err(ApiError::InvalidApiKey)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        check_api_key(&parts.headers, &state.api_key)?;
        Ok(RequireApiKey)
    }
}
