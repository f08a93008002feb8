use crate::error::{ApiError, ErrorResponse};
use crate::models::{FarmerDetail, FarmerSummary};
use crate::routes;
use crate::state::AppState;
use axum::{Json, extract::Path, extract::State, http::StatusCode};

/// GET /api/farmers handler - List every farmer
///
/// Each entry carries all five public fields, defaulted to `""` when the
/// stored record omits them. An absent collection lists as `[]`.
#[utoipa::path(
    get,
    path = routes::FARMERS,
    responses(
        (status = 200, description = "All farmers", body = [FarmerSummary]),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn list_farmers_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<FarmerSummary>>), ApiError> {
    let farmers = state.gateway.list_farmers().await?;

    tracing::info!("Listed {} farmers", farmers.len());
    Ok((StatusCode::OK, Json(farmers)))
}

/// GET /api/farmers/{id} handler - Retrieve one farmer record
#[utoipa::path(
    get,
    path = routes::FARMER_ITEM,
    params(
        ("id" = String, Path, description = "Farmer key under the userid collection")
    ),
    responses(
        (status = 200, description = "Farmer found: the public fields, defaulted, plus any other stored fields", body = serde_json::Value),
        (status = 404, description = "Farmer not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "farmers"
)]
pub async fn get_farmer_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<FarmerDetail>), ApiError> {
    match state.gateway.get_farmer(&id).await? {
        Some(farmer) => {
            tracing::info!("Successfully retrieved farmer with id: {}", id);
            Ok((StatusCode::OK, Json(farmer)))
        }
        None => {
            tracing::info!("Farmer not found with id: {}", id);
            Err(ApiError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FAILING_STORE_MESSAGE, body_json, failing_state, test_state};
    use axum::{Router, body::Body, http::Request, routing::get};
    use serde_json::{Value as JsonValue, json};
    use tower::ServiceExt;

    fn setup_test_app(state: AppState) -> Router {
        Router::new()
            .route(routes::FARMERS, get(list_farmers_handler))
            .route(routes::FARMER_ITEM, get(get_farmer_handler))
            .with_state(state)
    }

    async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_farmer_success() {
        let app = setup_test_app(test_state(json!({
            "userid": {"abc123": {"name": "Asha"}}
        })));

        let response = get_uri(app, "/api/farmers/abc123").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"id": "abc123", "name": "Asha", "citylabel": "", "state": "", "phone": "", "email": ""})
        );
    }

    #[tokio::test]
    async fn test_get_farmer_keeps_every_stored_field() {
        let record = json!({
            "name": "Ravi",
            "citylabel": "Nashik",
            "crops": ["onion", "grape"],
            "land": {"acres": 4.5}
        });
        let app = setup_test_app(test_state(json!({"userid": {"f-77": record}})));

        let response = get_uri(app, "/api/farmers/f-77").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], "f-77");
        assert_eq!(body["citylabel"], "Nashik");
        assert_eq!(body["email"], "");
        assert_eq!(body["crops"], json!(["onion", "grape"]));
        assert_eq!(body["land"]["acres"], json!(4.5));
    }

    #[tokio::test]
    async fn test_get_farmer_not_found() {
        let app = setup_test_app(test_state(json!({
            "userid": {"abc123": {"name": "Asha"}}
        })));

        let response = get_uri(app, "/api/farmers/nobody").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn test_get_farmer_invalid_key_is_server_error() {
        let app = setup_test_app(test_state(JsonValue::Null));

        let response = get_uri(app, "/api/farmers/a.b").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid key \"a.b\""));
    }

    #[tokio::test]
    async fn test_get_farmer_store_failure() {
        let app = setup_test_app(failing_state());

        let response = get_uri(app, "/api/farmers/abc123").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains(FAILING_STORE_MESSAGE));
    }

    #[tokio::test]
    async fn test_list_farmers_defaults_fields() {
        let app = setup_test_app(test_state(json!({
            "userid": {
                "abc123": {"name": "Asha"},
                "def456": {
                    "name": "Ravi",
                    "citylabel": "Nashik",
                    "state": "Maharashtra",
                    "phone": "9876543210",
                    "email": "ravi@example.com",
                    "password": "not exposed"
                }
            }
        })));

        let response = get_uri(app, "/api/farmers").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!([
                {"id": "abc123", "name": "Asha", "citylabel": "", "state": "", "phone": "", "email": ""},
                {
                    "id": "def456",
                    "name": "Ravi",
                    "citylabel": "Nashik",
                    "state": "Maharashtra",
                    "phone": "9876543210",
                    "email": "ravi@example.com"
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_list_farmers_empty() {
        let app = setup_test_app(test_state(JsonValue::Null));

        let response = get_uri(app, "/api/farmers").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_list_farmers_store_failure() {
        let app = setup_test_app(failing_state());

        let response = get_uri(app, "/api/farmers").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error_response: ErrorResponse =
            serde_json::from_slice(&axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert!(error_response.error.contains(FAILING_STORE_MESSAGE));
    }
}
