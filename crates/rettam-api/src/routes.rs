//! API route definitions

use crate::handlers::{extract, health};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Extraction routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/breakup", post(extract::breakup))
        .route("/rettam/nodes", post(extract::rettam_nodes))
}

/// Probe and metrics routes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::prometheus_metrics))
}
