//! Route table and the inbound policy layers wrapped around it.

use axum::http::Method;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::error;
use crate::handlers;
use crate::middleware::{add_security_headers, enforce_rate_limit};
use crate::state::AppState;

// Route path constants - single source of truth for all API paths
pub const HEALTH: &str = "/api/health";
pub const FARMERS: &str = "/api/farmers";
pub const FARMER_ITEM: &str = "/api/farmers/{id}";
pub const PEST_REPORT: &str = "/api/pest-report";
pub const ALERTS: &str = "/api/alerts";
pub const SCHEMES: &str = "/api/schemes";
pub const REPORTS: &str = "/api/reports";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Build the complete router with all routes and the inbound policy layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    let rate_limiter = state.rate_limiter.clone();

    let api: Router = Router::new()
        .route(HEALTH, get(handlers::health_handler))
        .route(FARMERS, get(handlers::list_farmers_handler))
        .route(FARMER_ITEM, get(handlers::get_farmer_handler))
        .route(PEST_REPORT, get(handlers::pest_report_handler))
        .route(ALERTS, post(handlers::create_alert_handler))
        .route(SCHEMES, post(handlers::create_scheme_handler))
        .route(REPORTS, post(handlers::create_report_handler))
        .fallback(error::not_found)
        .with_state(state);

    // Trailing slashes are trimmed for the API only; the Swagger UI
    // redirects `/swagger-ui` to `/swagger-ui/` itself.
    Router::new()
        .merge(SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, ApiDoc::openapi()))
        .fallback_service(NormalizePath::trim_trailing_slash(api))
        .layer(middleware::from_fn_with_state(rate_limiter, enforce_rate_limit))
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
