//! Metadata extraction handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use rettam_core::{AnnotatedResult, ExtractionResult};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Body of `/breakup`
#[derive(Debug, Deserialize, ToSchema)]
pub struct BreakupRequest {
    /// Text to analyze
    #[serde(default)]
    #[schema(example = "The quick brown fox jumps over the lazy dog.")]
    pub text: String,
}

/// A canvas node contributing text
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContentNode {
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `/rettam/nodes`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RettamNodesRequest {
    #[serde(default)]
    pub origin_node: ContentNode,
    #[serde(default)]
    pub context_nodes: Vec<ContentNode>,
}

impl RettamNodesRequest {
    /// Context contents in order, each followed by a space, then the origin
    /// content; surrounding whitespace stripped
    pub fn combined_text(&self) -> String {
        let mut text = String::new();
        for content in self.context_nodes.iter().filter_map(|n| n.content.as_deref()) {
            text.push_str(content);
            text.push(' ');
        }
        if let Some(origin) = self.origin_node.content.as_deref() {
            text.push_str(origin);
        }
        text.trim().to_string()
    }
}

/// Extract metadata from free text
#[utoipa::path(
    post,
    path = "/breakup",
    tag = "extraction",
    request_body = BreakupRequest,
    responses(
        (status = 200, description = "Extraction result with empty human_tags"),
        (status = 400, description = "No text provided", body = ApiError),
        (status = 500, description = "A model capability failed", body = ApiError)
    )
)]
pub async fn breakup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BreakupRequest>, JsonRejection>,
) -> Result<Json<AnnotatedResult>, AppError> {
    state.increment_requests();
    let Json(req) = payload?;

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("No text provided".to_string()));
    }

    let metadata = state.extractor.extract_metadata(&req.text).await?;
    state.record_extraction();

    Ok(Json(AnnotatedResult::from(metadata)))
}

/// Extract metadata from an origin node and its context nodes
#[utoipa::path(
    post,
    path = "/rettam/nodes",
    tag = "extraction",
    request_body = RettamNodesRequest,
    responses(
        (status = 200, description = "Extraction result for the combined text"),
        (status = 400, description = "Combined text is empty", body = ApiError),
        (status = 500, description = "A model capability failed", body = ApiError)
    )
)]
pub async fn rettam_nodes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RettamNodesRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, AppError> {
    state.increment_requests();
    let Json(req) = payload?;

    let text = req.combined_text();
    if text.is_empty() {
        return Err(AppError::BadRequest("Empty string input".to_string()));
    }
    tracing::debug!(
        context_nodes = req.context_nodes.len(),
        text_len = text.len(),
        "Combined node text"
    );

    let metadata = state.extractor.extract_metadata(&text).await?;
    state.record_extraction();

    Ok(Json(metadata))
}
