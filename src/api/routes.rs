//! API Routes
//!
//! Configures the Axum router with all bus tracker endpoints.

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{buses_handler, health_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` and `GET /buses` - Buses on the requested lines
/// - `GET /stats` - Freshness and refresh counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Any origin, GET/OPTIONS, Content-Type
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Build router with all endpoints
    Router::new()
        .route("/", get(buses_handler))
        .route("/buses", get(buses_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
