use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::inspection::{Inspection, InspectionError};
use crate::store::StoreError;

use super::MARKSURE_STATUS_HEADER;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("This image has already been processed")]
    Duplicate(Box<Inspection>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("AI service is currently unavailable")]
    ServiceUnavailable(String),

    #[error("Failed to analyze image")]
    AnalysisFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GatewayError {
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GatewayError::Duplicate(existing) => Some(json!({
                "existingInspectionId": existing.inspection_id,
                "existingResult": existing.result,
            })),
            GatewayError::ServiceUnavailable(reason) | GatewayError::AnalysisFailed(reason) => {
                Some(json!({ "reason": reason }))
            }
            _ => None,
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => GatewayError::InvalidRequest(msg),
            StoreError::MarkingNotFound(_) => {
                GatewayError::NotFound("OEM marking not found".to_string())
            }
            StoreError::InspectionNotFound(_) => {
                GatewayError::NotFound("Inspection not found".to_string())
            }
            e @ (StoreError::DuplicateMarking { .. } | StoreError::Conflict(_)) => {
                GatewayError::Conflict(e.to_string())
            }
            e @ (StoreError::Io(_) | StoreError::Snapshot { .. }) => {
                GatewayError::InternalError(e.to_string())
            }
        }
    }
}

impl From<InspectionError> for GatewayError {
    fn from(err: InspectionError) -> Self {
        match err {
            InspectionError::InvalidUpload(msg) => GatewayError::InvalidRequest(msg),
            e @ InspectionError::UnsupportedMediaType(_) => {
                GatewayError::UnsupportedMediaType(e.to_string())
            }
            e @ InspectionError::PayloadTooLarge { .. } => {
                GatewayError::PayloadTooLarge(e.to_string())
            }
            InspectionError::Duplicate(existing) => GatewayError::Duplicate(existing),
            e @ InspectionError::StillProcessing(_) => GatewayError::Conflict(e.to_string()),
            InspectionError::Ocr(e) if e.is_unavailable() => {
                GatewayError::ServiceUnavailable(e.to_string())
            }
            InspectionError::Ocr(e) => GatewayError::AnalysisFailed(e.to_string()),
            InspectionError::Store(e) => e.into(),
            InspectionError::Io(e) => GatewayError::AnalysisFailed(e.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, marksure_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
            GatewayError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            GatewayError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            GatewayError::UnsupportedMediaType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
            ),
            GatewayError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ai_unavailable")
            }
            GatewayError::AnalysisFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "analysis_error")
            }
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            error!(error = %self, details = ?self.details(), "Request failed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            MARKSURE_STATUS_HEADER,
            HeaderValue::from_str(marksure_status).unwrap_or(HeaderValue::from_static("error")),
        );

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
            code: status.as_u16(),
            details: self.details(),
        });

        (status, headers, body).into_response()
    }
}
