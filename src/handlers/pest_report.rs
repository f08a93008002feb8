use crate::error::{ApiError, ErrorResponse};
use crate::routes;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value as JsonValue;

/// GET /api/pest-report handler - Return the pest report tree as stored
#[utoipa::path(
    get,
    path = routes::PEST_REPORT,
    responses(
        (status = 200, description = "Pest reports, or an empty object", body = serde_json::Value),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "pest-report"
)]
pub async fn pest_report_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<JsonValue>), ApiError> {
    let report = state.gateway.pest_report().await?;
    Ok((StatusCode::OK, Json(report)))
}
