use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::constants::DEFAULT_ANALYTICS_WINDOW_DAYS;
use crate::inspection::{Inspection, InspectionUpload, VerificationRequest};
use crate::ocr::OcrEngine;
use crate::store::{HistoryQuery, InspectionAnalytics, PageRequest};

use super::error::GatewayError;
use super::response::{ok, paginated, respond};
use super::state::HandlerState;
use super::{MARKSURE_STATUS_OK, operator_from_headers};

#[derive(Serialize)]
struct InspectionData {
    inspection: Inspection,
}

#[derive(Serialize)]
struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize)]
struct AnalyticsData {
    analytics: InspectionAnalytics,
    period: Period,
}

/// Query string of the analytics endpoint.
///
/// An explicit `startDate`/`endDate` pair wins over `period` (`"{days}d"`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    pub period: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AnalyticsParams {
    fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), GatewayError> {
        let (start, end) = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => (now - Duration::days(period_days(self.period.as_deref())), now),
        };
        if start > end {
            return Err(GatewayError::InvalidRequest(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok((start, end))
    }
}

/// Parses `"7d"` or `"7"` into days; anything else means the default window.
fn period_days(period: Option<&str>) -> i64 {
    period
        .map(|p| p.trim().trim_end_matches(['d', 'D']))
        .and_then(|p| p.parse::<i64>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_ANALYTICS_WINDOW_DAYS)
}

pub(crate) fn query_error(rejection: QueryRejection) -> GatewayError {
    GatewayError::InvalidRequest(format!("Invalid query string: {}", rejection.body_text()))
}

pub(crate) fn json_error(rejection: JsonRejection) -> GatewayError {
    GatewayError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
}

fn multipart_error(err: MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(err.body_text())
    } else {
        GatewayError::InvalidRequest(err.body_text())
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

async fn read_upload(
    multipart: &mut Multipart,
    operator: String,
) -> Result<InspectionUpload, GatewayError> {
    let mut upload = InspectionUpload {
        operator,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                upload.file_name = field.file_name().unwrap_or("upload").to_string();
                upload.mime_type = field.content_type().unwrap_or_default().to_string();
                upload.bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
            }
            "ocrEngine" => {
                if let Some(engine) = non_empty(field.text().await.map_err(multipart_error)?) {
                    upload.engine = engine
                        .parse::<OcrEngine>()
                        .map_err(GatewayError::InvalidRequest)?;
                }
            }
            "location" => upload.location = non_empty(field.text().await.map_err(multipart_error)?),
            "station" => upload.station = non_empty(field.text().await.map_err(multipart_error)?),
            "notes" => upload.notes = non_empty(field.text().await.map_err(multipart_error)?),
            "tags" => upload.tags = split_tags(&field.text().await.map_err(multipart_error)?),
            _ => debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    Ok(upload)
}

#[instrument(skip(state, headers, multipart))]
pub async fn analyze_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, GatewayError> {
    let mut multipart = multipart
        .map_err(|e| GatewayError::InvalidRequest(format!("Expected a multipart form: {}", e.body_text())))?;
    let upload = read_upload(&mut multipart, operator_from_headers(&headers)).await?;

    let inspection = state.service.analyze(upload).await?;

    let marker = inspection
        .result
        .as_ref()
        .map_or(MARKSURE_STATUS_OK, |r| r.classification.as_str());
    Ok(respond(
        StatusCode::OK,
        marker,
        "Image analyzed successfully",
        InspectionData { inspection },
    ))
}

#[instrument(skip(state))]
pub async fn get_inspection_handler(
    State(state): State<HandlerState>,
    Path(inspection_id): Path<String>,
) -> Result<Response, GatewayError> {
    let inspection = state.service.get(&inspection_id)?;
    Ok(ok(
        "Inspection retrieved successfully",
        InspectionData { inspection },
    ))
}

#[instrument(skip(state, page, query))]
pub async fn history_handler(
    State(state): State<HandlerState>,
    page: Result<Query<PageRequest>, QueryRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(page) = page.map_err(query_error)?;
    let Query(query) = query.map_err(query_error)?;
    let page = page.validate()?;

    let history = state.database().inspections.history(&query, page);
    Ok(paginated("Inspection history retrieved successfully", history))
}

#[instrument(skip(state, params))]
pub async fn analytics_handler(
    State(state): State<HandlerState>,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(params) = params.map_err(query_error)?;
    let (start, end) = params.window(Utc::now())?;

    let analytics = state.database().inspections.analytics(start, end);
    Ok(ok(
        "Analytics retrieved successfully",
        AnalyticsData {
            analytics,
            period: Period { start, end },
        },
    ))
}

#[instrument(skip(state, headers, body))]
pub async fn verify_handler(
    State(state): State<HandlerState>,
    Path(inspection_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(body) = body.map_err(json_error)?;
    let request: VerificationRequest = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid verification: {e}")))?;

    let inspection = state
        .service
        .verify(&inspection_id, request, &operator_from_headers(&headers))
        .await?;
    Ok(ok(
        "Inspection verified successfully",
        InspectionData { inspection },
    ))
}
