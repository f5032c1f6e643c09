//! HTTP gateway (Axum) for inspections and the OEM reference database.
//!
//! Every response carries an `X-MarkSure-Status` header: the verdict for a
//! finished analysis, an error code for failures, `ok` otherwise.

pub mod error;
pub mod inspections;
pub mod markings;
pub mod response;
pub mod state;


use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::GatewayError;
pub use state::HandlerState;

use inspections::{
    analytics_handler, analyze_handler, get_inspection_handler, history_handler, verify_handler,
};
use markings::{
    create_marking_handler, deactivate_marking_handler, get_marking_handler,
    list_markings_handler, manufacturers_handler, stats_handler, update_marking_handler,
};

pub const MARKSURE_STATUS_HEADER: &str = "X-MarkSure-Status";
pub const MARKSURE_STATUS_OK: &str = "ok";
pub const MARKSURE_STATUS_HEALTHY: &str = "healthy";
pub const MARKSURE_STATUS_READY: &str = "ready";
pub const MARKSURE_STATUS_ERROR: &str = "error";

/// Operator recorded when a request carries no bearer identity.
pub const ANONYMOUS_OPERATOR: &str = "anonymous";

/// Room left for the non-file form fields on top of the upload limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Takes the operator identity verbatim from `Authorization: Bearer <operator>`.
pub fn operator_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_OPERATOR)
        .to_string()
}

pub fn create_router_with_state(state: HandlerState) -> Router {
    let upload_limit = state
        .service
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route(
            "/api/inspections/analyze",
            post(analyze_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/inspections", get(history_handler))
        .route("/api/inspections/analytics", get(analytics_handler))
        .route("/api/inspections/{id}", get(get_inspection_handler))
        .route("/api/inspections/{id}/verify", post(verify_handler))
        .route(
            "/api/oem/markings",
            get(list_markings_handler).post(create_marking_handler),
        )
        .route(
            "/api/oem/markings/{id}",
            get(get_marking_handler)
                .put(update_marking_handler)
                .delete(deactivate_marking_handler),
        )
        .route("/api/oem/manufacturers", get(manufacturers_handler))
        .route("/api/oem/stats", get(stats_handler))
        .fallback(not_found_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub storage: &'static str,
    pub ai_service: &'static str,
    pub ocr_backend: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        MARKSURE_STATUS_HEADER,
        HeaderValue::from_static(MARKSURE_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let storage_status = if state.storage_path.is_dir() {
        MARKSURE_STATUS_READY
    } else {
        MARKSURE_STATUS_ERROR
    };

    let ai_status = if state.service.ocr().is_available().await {
        MARKSURE_STATUS_READY
    } else {
        "unavailable"
    };

    let components = ComponentStatus {
        http: MARKSURE_STATUS_READY,
        storage: storage_status,
        ai_service: ai_status,
        ocr_backend: state.service.ocr().name(),
    };

    let is_ready =
        components.storage == MARKSURE_STATUS_READY && components.ai_service == MARKSURE_STATUS_READY;

    let status_code = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status_msg = if is_ready { "ok" } else { "pending" };

    let mut headers = HeaderMap::new();
    headers.insert(
        MARKSURE_STATUS_HEADER,
        HeaderValue::from_str(status_msg).unwrap_or(HeaderValue::from_static(MARKSURE_STATUS_ERROR)),
    );

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}

async fn not_found_handler(uri: Uri) -> GatewayError {
    GatewayError::NotFound(format!("Not found - {uri}"))
}
