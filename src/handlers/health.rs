use crate::error::HealthResponse;
use crate::routes;
use axum::{Json, http::StatusCode};

/// GET /api/health handler - Health check endpoint
///
/// Always answers `{"ok": true}`; the store is not consulted.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    tracing::debug!("Health check");
    (StatusCode::OK, Json(HealthResponse { ok: true }))
}
