use crate::error::{ApiError, ErrorResponse};
use crate::models::{Collection, CreatePayload, CreatedRecord};
use crate::routes;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};

/// Whether the request declares a JSON body
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

/// Shared body of the three create routes.
///
/// Only JSON bodies are parsed; any other content type is left unread and
/// the record starts out empty.
async fn create_record(
    state: &AppState,
    collection: Collection,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(StatusCode, Json<CreatedRecord>), ApiError> {
    let payload = if is_json(headers) {
        CreatePayload::from_slice(body)?
    } else {
        tracing::debug!("Ignoring non-JSON body for {}", collection.path());
        CreatePayload::default()
    };
    let record = state.gateway.create(collection, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/alerts handler - Store a new alert
#[utoipa::path(
    post,
    path = routes::ALERTS,
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Alert stored: the body plus createdAt and id", body = serde_json::Value),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "records"
)]
pub async fn create_alert_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedRecord>), ApiError> {
    create_record(&state, Collection::Alerts, &headers, &body).await
}

/// POST /api/schemes handler - Store a new scheme
#[utoipa::path(
    post,
    path = routes::SCHEMES,
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Scheme stored: the body plus createdAt and id", body = serde_json::Value),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "records"
)]
pub async fn create_scheme_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedRecord>), ApiError> {
    create_record(&state, Collection::Schemes, &headers, &body).await
}

/// POST /api/reports handler - Store a new report
#[utoipa::path(
    post,
    path = routes::REPORTS,
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Report stored: the body plus createdAt and id", body = serde_json::Value),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "records"
)]
pub async fn create_report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedRecord>), ApiError> {
    create_record(&state, Collection::Reports, &headers, &body).await
}
