//! HTTP routes for the Throttl service

mod handlers;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::ThrottlService;

/// Shared handler state
pub type AppState = Arc<ThrottlService>;

/// Build the REST router over `service`
pub fn router(service: Arc<ThrottlService>) -> Router {
    // Browser dashboards poll status from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // API configurations
        .route("/apis", get(handlers::list_apis).post(handlers::register_api))
        .route("/apis/:api_id", get(handlers::get_api))
        // Usage
        .route("/usage", post(handlers::record_usage))
        .route("/status/:api_id", get(handlers::status))
        // Health
        .route("/test", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}
