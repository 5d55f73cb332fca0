//! Health check handlers

use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub name: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub models: ModelEndpoints,
}

/// Model services the extractor was configured with
#[derive(Serialize, ToSchema)]
pub struct ModelEndpoints {
    pub syntax: String,
    pub ner: String,
    pub sentiment: String,
    pub tokenizer: Option<String>,
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let models = &state.config.models;

    let response = ReadinessResponse {
        ready: is_ready,
        models: ModelEndpoints {
            syntax: models.syntax_url.clone(),
            ner: models.ner_url.clone(),
            sentiment: models.sentiment_url.clone(),
            tokenizer: models.tokenizer_url.clone(),
        },
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus-compatible metrics endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Metrics in Prometheus text format")
    )
)]
pub async fn prometheus_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut output = String::new();

    output.push_str("# HELP rettam_uptime_seconds Time since server start\n");
    output.push_str("# TYPE rettam_uptime_seconds gauge\n");
    output.push_str(&format!("rettam_uptime_seconds {}\n\n", state.uptime_secs()));

    output.push_str("# HELP rettam_requests_total Total number of extraction requests\n");
    output.push_str("# TYPE rettam_requests_total counter\n");
    output.push_str(&format!(
        "rettam_requests_total {}\n\n",
        state.get_request_count()
    ));

    output.push_str("# HELP rettam_extractions_total Successful metadata extractions\n");
    output.push_str("# TYPE rettam_extractions_total counter\n");
    output.push_str(&format!(
        "rettam_extractions_total {}\n\n",
        state.get_extraction_count()
    ));

    output.push_str("# HELP rettam_build_info Build information\n");
    output.push_str("# TYPE rettam_build_info gauge\n");
    output.push_str(&format!(
        "rettam_build_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    ));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        output,
    )
}
