use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Encoder capabilities
        .route("/capabilities", get(handlers::get_capabilities))
        .route("/capabilities/refresh", post(handlers::refresh_capabilities))
        // Conversion
        .route("/convert", post(handlers::convert))
        .route("/estimate", post(handlers::estimate))
        .route("/process", post(handlers::process))
        .route("/batch", post(handlers::batch))
        .route("/stats", get(handlers::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
