//! Rettam API - HTTP server for metadata extraction
//!
//! Exposes the extraction pipeline over `/breakup` (free text) and
//! `/rettam/nodes` (an origin node plus context nodes).

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use state::AppState;
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rettam API",
        description = "Named entities, noun chunks, dependencies and sentiment for text"
    ),
    paths(
        handlers::extract::breakup,
        handlers::extract::rettam_nodes,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::prometheus_metrics,
    ),
    components(schemas(
        handlers::extract::BreakupRequest,
        handlers::extract::RettamNodesRequest,
        handlers::extract::ContentNode,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ModelEndpoints,
        error::ApiError,
    )),
    tags(
        (name = "extraction", description = "Metadata extraction"),
        (name = "health", description = "Probes and metrics")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let body_limit = state.config.server.max_body_size;

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::api_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Wait for `signal`, then stop reporting ready so that load balancers
/// drain the instance while in-flight requests finish
pub async fn shutdown_signal<F>(state: Arc<AppState>, signal: F)
where
    F: Future<Output = ()>,
{
    signal.await;
    state.set_ready(false);
    tracing::info!("Shutdown requested, no longer ready");
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Allow the configured origins; unparsable entries are skipped
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rettam_core::config::AppConfig;
    use rettam_extractor::testing::FakeCapabilities;

    #[tokio::test]
    async fn test_shutdown_signal_clears_readiness() {
        let fakes = FakeCapabilities::new();
        let state = Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(fakes.extractor(512)),
        ));
        assert!(state.is_ready());

        shutdown_signal(state.clone(), std::future::ready(())).await;
        assert!(!state.is_ready());
    }
}
