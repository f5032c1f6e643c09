//! Filtering and pagination for list endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::Classification;
use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::inspection::Inspection;

use super::error::{StoreError, StoreResult};
use super::model::{Category, OemMarking, PackageType};

/// 1-based page request. Missing fields take defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::default_page")]
    pub page: u32,
    #[serde(default = "PageRequest::default_limit")]
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    fn default_page() -> u32 {
        1
    }

    fn default_limit() -> u32 {
        DEFAULT_PAGE_LIMIT
    }

    pub fn new(page: u32, limit: u32) -> StoreResult<Self> {
        Self { page, limit }.validate()
    }

    pub fn validate(self) -> StoreResult<Self> {
        if self.page < 1 {
            return Err(StoreError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(StoreError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(self)
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Cuts one page out of an already filtered and ordered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Page<T> {
        let mut total = 0usize;
        let offset = self.offset();
        let limit = self.limit as usize;
        let mut page_items = Vec::with_capacity(limit.min(64));

        for (i, item) in items.into_iter().enumerate() {
            total += 1;
            if i >= offset && page_items.len() < limit {
                page_items.push(item);
            }
        }

        Page {
            items: page_items,
            page: self.page,
            limit: self.limit,
            total,
        }
    }
}

/// One page of results plus the counts needed to render pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit.max(1) as usize)
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Filters for the reference marking list. Only active markings are listed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingQuery {
    /// Case-insensitive substring over part number, manufacturer, marking text and tags.
    pub search: Option<String>,
    /// Case-insensitive manufacturer substring.
    pub manufacturer: Option<String>,
    pub category: Option<Category>,
    pub package_type: Option<PackageType>,
}

impl MarkingQuery {
    pub fn matches(&self, marking: &OemMarking) -> bool {
        if !marking.is_active {
            return false;
        }
        if let Some(search) = non_empty(&self.search) {
            let hit = contains_ci(&marking.ic_part_number, &search)
                || contains_ci(&marking.manufacturer, &search)
                || contains_ci(&marking.marking.text, &search)
                || marking.tags.iter().any(|t| contains_ci(t, &search));
            if !hit {
                return false;
            }
        }
        if let Some(manufacturer) = non_empty(&self.manufacturer)
            && !contains_ci(&marking.manufacturer, &manufacturer)
        {
            return false;
        }
        if self.category.is_some_and(|c| c != marking.category) {
            return false;
        }
        if self.package_type.is_some_and(|p| p != marking.package_type) {
            return false;
        }
        true
    }
}

/// Filters for inspection history. Archived inspections are never listed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub classification: Option<Classification>,
    /// Inclusive lower bound on `createdAt`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `createdAt`.
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive substring over extracted text, inspection id and notes.
    pub search: Option<String>,
    /// Exact operator identity.
    pub operator: Option<String>,
}

impl HistoryQuery {
    pub fn matches(&self, inspection: &Inspection) -> bool {
        if inspection.archived {
            return false;
        }
        if let Some(wanted) = self.classification {
            let actual = inspection.result.as_ref().map(|r| r.classification);
            if actual != Some(wanted) {
                return false;
            }
        }
        if self.start_date.is_some_and(|start| inspection.created_at < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| inspection.created_at > end) {
            return false;
        }
        if let Some(search) = non_empty(&self.search) {
            let text_hit = inspection
                .ocr_results
                .as_ref()
                .is_some_and(|o| contains_ci(&o.extracted_text, &search));
            let notes_hit = inspection
                .metadata
                .notes
                .as_deref()
                .is_some_and(|n| contains_ci(n, &search));
            if !(text_hit || contains_ci(&inspection.inspection_id, &search) || notes_hit) {
                return false;
            }
        }
        if let Some(operator) = self.operator.as_deref().filter(|o| !o.is_empty())
            && inspection.metadata.operator != operator
        {
            return false;
        }
        true
    }
}

/// Aggregates over inspections created inside a time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionAnalytics {
    pub total_inspections: u64,
    pub genuine: u64,
    pub fake: u64,
    pub suspicious: u64,
    pub inconclusive: u64,
    /// Mean processing time in milliseconds over finished inspections.
    pub avg_processing_time: f64,
    pub avg_confidence: f64,
    pub avg_similarity: f64,
}

/// Aggregates over the active reference markings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingStats {
    pub total_markings: u64,
    pub total_manufacturers: u64,
    pub total_categories: u64,
    pub total_package_types: u64,
    /// Mean `timesUsed`, rounded to two decimals.
    pub avg_times_used: f64,
    pub total_usage: u64,
}

/// Running mean that ignores absent samples.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub(crate) fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    pub(crate) fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}
