//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rettam_core::RettamError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    pub error: String,
    /// Error code
    pub code: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Extraction(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Extraction(msg) => {
                tracing::error!(error = %msg, "Extraction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("EXTRACTION_FAILED", "Metadata extraction failed").with_details(msg),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error().with_details(msg),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RettamError> for AppError {
    fn from(err: RettamError) -> Self {
        match err {
            RettamError::EmptyInput => AppError::BadRequest(err.to_string()),
            RettamError::ExtractionFailure { .. } => AppError::Extraction(err.to_string()),
            other if other.is_client_error() => AppError::BadRequest(other.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rettam_core::Capability;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(RettamError::EmptyInput),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(RettamError::extraction(Capability::Syntax, "down")),
            AppError::Extraction(msg) if msg.contains("down")
        ));
        assert!(matches!(
            AppError::from(RettamError::KeyCollision("entities".to_string())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::BadRequest("No text provided".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Extraction("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
