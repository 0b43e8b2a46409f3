//! HTTP API module for the prediction, health, and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
