use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests, please try again later.";

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Custom error type for API endpoints
///
/// Maps each failure to its HTTP status and renders it as
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Nothing stored at the requested location
    NotFound,
    /// Request body is not a JSON object
    InvalidBody(serde_json::Error),
    /// Store operation failed
    Store(StoreError),
    /// Client exceeded the request rate limit
    TooManyRequests,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string()),
            ApiError::InvalidBody(err) => (
                StatusCode::BAD_REQUEST,
                format!("Request body must be a JSON object: {}", err),
            ),
            ApiError::Store(err) => {
                tracing::error!("Store operation failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                TOO_MANY_REQUESTS_MESSAGE.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidBody(err)
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
