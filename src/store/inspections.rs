//! In-memory inspection store with a unique image-hash index.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::classification::Classification;
use crate::hashing::ImageHash;
use crate::inspection::Inspection;

use super::error::{StoreError, StoreResult};
use super::query::{HistoryQuery, InspectionAnalytics, Mean, Page, PageRequest};

/// Outcome of [`InspectionStore::reserve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// The record was inserted; the caller owns the analysis.
    Reserved,
    /// Another inspection already holds this image hash.
    Duplicate(Box<Inspection>),
}

#[derive(Default)]
struct Table {
    by_id: HashMap<String, Inspection>,
    by_hash: HashMap<ImageHash, String>,
}

#[derive(Default)]
pub struct InspectionStore {
    table: RwLock<Table>,
}

impl InspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted records. Later duplicates of a hash are dropped.
    ///
    /// Records still pending were cut off mid-analysis; they are closed with the
    /// analysis-error verdict and marked retryable.
    pub fn from_inspections(inspections: Vec<Inspection>) -> Self {
        let store = Self::new();
        let now = Utc::now();
        for mut inspection in inspections {
            if inspection.is_pending() {
                warn!(
                    inspection_id = %inspection.inspection_id,
                    "Closing inspection interrupted before its analysis finished"
                );
                inspection.fail(now);
                inspection.retryable = true;
            }
            if inspection.retryable {
                store
                    .table
                    .write()
                    .by_id
                    .insert(inspection.inspection_id.clone(), inspection);
                continue;
            }
            if let Reservation::Duplicate(existing) = store.reserve(inspection) {
                debug!(
                    existing = %existing.inspection_id,
                    "Skipping persisted inspection with duplicate image hash"
                );
            }
        }
        store
    }

    /// Inserts `inspection` unless its image hash is already taken.
    ///
    /// The check and the insert happen under one write lock, so two concurrent
    /// uploads of the same bytes produce exactly one record.
    pub fn reserve(&self, inspection: Inspection) -> Reservation {
        let mut table = self.table.write();

        if let Some(existing) = table
            .by_hash
            .get(&inspection.image.hash)
            .and_then(|id| table.by_id.get(id))
        {
            return Reservation::Duplicate(Box::new(existing.clone()));
        }

        table
            .by_hash
            .insert(inspection.image.hash, inspection.inspection_id.clone());
        table
            .by_id
            .insert(inspection.inspection_id.clone(), inspection);
        Reservation::Reserved
    }

    /// Replaces a previously reserved record.
    pub fn save(&self, inspection: Inspection) -> StoreResult<()> {
        let mut table = self.table.write();
        match table.by_id.get_mut(&inspection.inspection_id) {
            Some(slot) if slot.image.hash == inspection.image.hash => {
                *slot = inspection;
                Ok(())
            }
            Some(_) => Err(StoreError::Conflict(format!(
                "image hash of inspection {} cannot change",
                inspection.inspection_id
            ))),
            None => Err(StoreError::InspectionNotFound(inspection.inspection_id)),
        }
    }

    /// Marks a finished record retryable and frees its image hash.
    ///
    /// The record stays readable by id; only the duplicate check forgets it.
    pub fn release(&self, id: &str) -> StoreResult<()> {
        let mut table = self.table.write();
        let inspection = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| StoreError::InspectionNotFound(id.to_string()))?;
        inspection.retryable = true;
        let hash = inspection.image.hash;
        if table.by_hash.get(&hash).is_some_and(|holder| holder == id) {
            table.by_hash.remove(&hash);
        }
        debug!(inspection_id = id, %hash, "Image hash released");
        Ok(())
    }

    /// Mutates one record in place under the write lock.
    pub fn update<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Inspection) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut table = self.table.write();
        let inspection = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| StoreError::InspectionNotFound(id.to_string()))?;
        f(inspection)
    }

    pub fn get(&self, id: &str) -> StoreResult<Inspection> {
        self.table
            .read()
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::InspectionNotFound(id.to_string()))
    }

    pub fn find_by_hash(&self, hash: &ImageHash) -> Option<Inspection> {
        let table = self.table.read();
        table.by_hash.get(hash).and_then(|id| table.by_id.get(id)).cloned()
    }

    /// Non-archived inspections matching `query`, newest first.
    pub fn history(&self, query: &HistoryQuery, page: PageRequest) -> Page<Inspection> {
        let table = self.table.read();
        let mut hits: Vec<&Inspection> = table.by_id.values().filter(|i| query.matches(i)).collect();
        hits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.inspection_id.cmp(&a.inspection_id))
        });
        page.slice(hits.into_iter().cloned())
    }

    /// Aggregates over non-archived inspections created in `[start, end]`.
    pub fn analytics(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> InspectionAnalytics {
        let table = self.table.read();
        let mut analytics = InspectionAnalytics::default();
        let mut processing = Mean::default();
        let mut confidence = Mean::default();
        let mut similarity = Mean::default();

        for inspection in table
            .by_id
            .values()
            .filter(|i| !i.archived && i.created_at >= start && i.created_at <= end)
        {
            analytics.total_inspections += 1;
            match inspection.result.as_ref().map(|r| r.classification) {
                Some(Classification::Genuine) => analytics.genuine += 1,
                Some(Classification::Fake) => analytics.fake += 1,
                Some(Classification::Suspicious) => analytics.suspicious += 1,
                Some(Classification::Inconclusive) => analytics.inconclusive += 1,
                None => {}
            }
            processing.add(inspection.processing.duration.map(|d| d as f64));
            confidence.add(inspection.result.as_ref().map(|r| r.confidence));
            similarity.add(inspection.overall_similarity());
        }

        analytics.avg_processing_time = processing.value();
        analytics.avg_confidence = confidence.value();
        analytics.avg_similarity = similarity.value();
        analytics
    }

    /// All records, oldest first, for persistence.
    pub fn all(&self) -> Vec<Inspection> {
        let mut all: Vec<Inspection> = self.table.read().by_id.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.inspection_id.cmp(&b.inspection_id))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.table.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().by_id.is_empty()
    }
}
