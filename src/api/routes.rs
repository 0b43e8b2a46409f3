//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{self, AppState};

/// OpenAPI document for the prediction API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "spamguard API",
        description = "SMS spam classification gateway"
    ),
    paths(handlers::predict, handlers::health, handlers::metrics_endpoint),
    components(schemas(
        handlers::PredictRequest,
        handlers::PredictResponse,
        handlers::HealthResponse,
        crate::model::Label,
    )),
    tags(
        (name = "predict", description = "Spam classification"),
        (name = "health", description = "Health and metrics")
    )
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Prediction endpoint
        .route("/predict", post(handlers::predict))
        // Health and metrics endpoints
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_endpoint))
        // Interactive API docs
        .merge(SwaggerUi::new("/apidocs").url("/apidocs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
