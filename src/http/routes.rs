//! HTTP routing configuration for all API endpoints.

use axum::{routing::get, Router};

use crate::http::handlers::*;
use crate::http::state::AppState;

/// Build the Axum router with all API endpoints.
///
/// # Parameters
///
/// - `state` - Application state containing configuration
///
/// # Returns
///
/// Returns configured Axum `Router` with the synthetic Prometheus query endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        // Prometheus Query API backed by synthetic series
        .route("/api/v1/query", get(query).post(query_form))
        .route("/api/v1/query_range", get(query_range).post(query_range_form))
        .with_state(state)
}
