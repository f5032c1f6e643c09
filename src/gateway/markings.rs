use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::matching::MarkingId;
use crate::store::{MarkingDraft, MarkingQuery, MarkingStats, MarkingView, PageRequest};

use super::error::GatewayError;
use super::inspections::{json_error, query_error};
use super::response::{ok, paginated, respond};
use super::state::HandlerState;
use super::{MARKSURE_STATUS_OK, operator_from_headers};

#[derive(Serialize)]
struct MarkingData {
    marking: MarkingView,
}

#[derive(Serialize)]
struct ManufacturersData {
    manufacturers: Vec<String>,
}

#[derive(Serialize)]
struct StatsData {
    stats: MarkingStats,
}

fn parse_marking_id(raw: &str) -> Result<MarkingId, GatewayError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| GatewayError::InvalidRequest(format!("Invalid OEM marking id '{raw}'")))
}

fn parse_draft(body: Result<Json<serde_json::Value>, JsonRejection>) -> Result<MarkingDraft, GatewayError> {
    let Json(body) = body.map_err(json_error)?;
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid OEM marking: {e}")))
}

#[instrument(skip(state, page, query))]
pub async fn list_markings_handler(
    State(state): State<HandlerState>,
    page: Result<Query<PageRequest>, QueryRejection>,
    query: Result<Query<MarkingQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(page) = page.map_err(query_error)?;
    let Query(query) = query.map_err(query_error)?;
    let page = page.validate()?;

    let markings = state.database().markings.list(&query, page).map(MarkingView::from);
    Ok(paginated("OEM markings retrieved successfully", markings))
}

#[instrument(skip(state, headers, body))]
pub async fn create_marking_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let draft = parse_draft(body)?;

    let marking = state
        .database()
        .markings
        .create(draft, &operator_from_headers(&headers))?;
    state.database().commit().await?;
    Ok(respond(
        StatusCode::CREATED,
        MARKSURE_STATUS_OK,
        "OEM marking created successfully",
        MarkingData {
            marking: marking.into(),
        },
    ))
}

#[instrument(skip(state))]
pub async fn get_marking_handler(
    State(state): State<HandlerState>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let marking = state.database().markings.get(parse_marking_id(&id)?)?;
    Ok(ok(
        "OEM marking retrieved successfully",
        MarkingData {
            marking: marking.into(),
        },
    ))
}

#[instrument(skip(state, headers, body))]
pub async fn update_marking_handler(
    State(state): State<HandlerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let id = parse_marking_id(&id)?;
    let draft = parse_draft(body)?;

    let marking = state
        .database()
        .markings
        .update(id, draft, &operator_from_headers(&headers))?;
    state.database().commit().await?;
    Ok(ok(
        "OEM marking updated successfully",
        MarkingData {
            marking: marking.into(),
        },
    ))
}

#[instrument(skip(state, headers))]
pub async fn deactivate_marking_handler(
    State(state): State<HandlerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    state
        .database()
        .markings
        .deactivate(parse_marking_id(&id)?, &operator_from_headers(&headers))?;
    state.database().commit().await?;
    Ok(ok("OEM marking deactivated successfully", ()))
}

#[instrument(skip(state))]
pub async fn manufacturers_handler(State(state): State<HandlerState>) -> Response {
    let manufacturers = state.database().markings.manufacturers();
    ok(
        "Manufacturers retrieved successfully",
        ManufacturersData { manufacturers },
    )
}

#[instrument(skip(state))]
pub async fn stats_handler(State(state): State<HandlerState>) -> Response {
    let stats = state.database().markings.stats();
    ok("OEM statistics retrieved successfully", StatsData { stats })
}
