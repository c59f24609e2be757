//! Proxy Routes
//!
//! Configures the Axum router: admin endpoints plus a catch-all forwarder.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, proxy_handler, stats_handler, AppState};

/// Creates the main router.
///
/// # Endpoints
/// - `GET /_proxy/health` - Health check endpoint
/// - `GET /_proxy/stats` - Upstream cache statistics
/// - anything else - Forwarded to the upstream for the request's Host
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/_proxy/health", get(health_handler))
        .route("/_proxy/stats", get(stats_handler))
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
