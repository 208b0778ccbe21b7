//! Route table for the rchat server
//!
//! - `/ping` - Liveness check, counted in `server_total_ping_hits`
//! - `/metrics` - Prometheus metrics in text format
//! - `/key/{key}` - Echoes the path parameter back (GET and POST)

use crate::server::metrics::{SharedMetrics, METRICS_CONTENT_TYPE};
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{error, info};

/// Shared state injected into handlers
#[derive(Clone)]
pub struct AppState {
    metrics: SharedMetrics,
}

impl AppState {
    pub fn new(metrics: SharedMetrics) -> Self {
        Self { metrics }
    }
}

/// Ping handler
///
/// Always answers `pong` and counts the hit.
async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.record_ping();
    info!("ping hit");
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain")], "pong")
}

/// Prometheus metrics handler
///
/// Returns metrics in Prometheus text format for scraping.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn get_key(Path(key): Path<String>) -> impl IntoResponse {
    info!(method = "GET", key = %key, "Key route hit");
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain")], key)
}

async fn post_key(Path(key): Path<String>) -> impl IntoResponse {
    info!(method = "POST", key = %key, "Key route hit");
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain")], key)
}

/// Build the router for ping, metrics, and key endpoints
pub fn build_router(metrics: SharedMetrics) -> Router {
    let state = AppState::new(metrics);

    Router::new()
        .route("/ping", get(ping))
        .route("/metrics", get(self::metrics))
        .route("/key/{key}", get(get_key).post(post_key))
        .with_state(state)
}
