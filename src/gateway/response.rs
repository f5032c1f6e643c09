//! Success envelopes shared by every JSON endpoint.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::store::Page;

use super::{MARKSURE_STATUS_HEADER, MARKSURE_STATUS_OK};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages(),
            total_items: page.total,
            items_per_page: page.limit,
            has_next_page: page.has_next(),
            has_prev_page: page.has_prev(),
        }
    }
}

/// `{success: true, message, data, pagination?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

fn status_headers(marker: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        MARKSURE_STATUS_HEADER,
        HeaderValue::from_str(marker).unwrap_or(HeaderValue::from_static(MARKSURE_STATUS_OK)),
    );
    headers
}

pub fn respond<T: Serialize>(
    status: StatusCode,
    marker: &str,
    message: &'static str,
    data: T,
) -> Response {
    let body = ApiResponse {
        success: true,
        message,
        data,
        pagination: None,
    };
    (status, status_headers(marker), Json(body)).into_response()
}

pub fn ok<T: Serialize>(message: &'static str, data: T) -> Response {
    respond(StatusCode::OK, MARKSURE_STATUS_OK, message, data)
}

pub fn paginated<T: Serialize>(message: &'static str, page: Page<T>) -> Response {
    let pagination = Pagination::from(&page);
    let body = ApiResponse {
        success: true,
        message,
        data: page.items,
        pagination: Some(pagination),
    };
    (
        StatusCode::OK,
        status_headers(MARKSURE_STATUS_OK),
        Json(body),
    )
        .into_response()
}
