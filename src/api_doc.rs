use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse};
use crate::handlers;
use crate::models::FarmerSummary;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "agrimitra-gateway API",
        version = "0.1.0",
        description = "HTTP gateway over the AgriMitra realtime database: farmers, pest reports, alerts, schemes and reports"
    ),
    paths(
        handlers::health::health_handler,
        handlers::farmers::list_farmers_handler,
        handlers::farmers::get_farmer_handler,
        handlers::pest_report::pest_report_handler,
        handlers::create::create_alert_handler,
        handlers::create::create_scheme_handler,
        handlers::create::create_report_handler
    ),
    components(
        schemas(
            FarmerSummary,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "farmers", description = "Farmer profile lookups"),
        (name = "pest-report", description = "Raw pest report tree"),
        (name = "records", description = "Append-only alert, scheme and report collections")
    )
)]
pub struct ApiDoc;
