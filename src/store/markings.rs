//! In-memory reference marking store.
//!
//! The matcher reads [`MarkingStore::active_markings`] on every inspection. That
//! snapshot is built once per generation and shared as an `Arc<[_]>`; every
//! mutation bumps the generation while holding the write lock, so a reader
//! never gets a snapshot older than the last completed write.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use moka::sync::Cache;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::matching::{MarkingId, ReferenceMarking};

use super::error::{StoreError, StoreResult};
use super::model::{MarkingDraft, OemMarking, UsageOutcome, UsageStats, round2};
use super::query::{MarkingQuery, MarkingStats, Page, PageRequest};

const SNAPSHOT_GENERATIONS: u64 = 4;

/// Active markings as handed to the matcher.
pub type ActiveMarkings = Arc<[ReferenceMarking]>;

pub struct MarkingStore {
    markings: RwLock<HashMap<MarkingId, OemMarking>>,
    generation: AtomicU64,
    active: Cache<u64, ActiveMarkings>,
}

impl Default for MarkingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkingStore {
    pub fn new() -> Self {
        Self::from_markings(Vec::new())
    }

    /// Builds a store holding `markings`, keyed by their ids.
    pub fn from_markings(markings: Vec<OemMarking>) -> Self {
        Self {
            markings: RwLock::new(markings.into_iter().map(|m| (m.id, m)).collect()),
            generation: AtomicU64::new(0),
            active: Cache::builder().max_capacity(SNAPSHOT_GENERATIONS).build(),
        }
    }

    /// Current generation; changes on every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Validates and inserts a new marking.
    pub fn create(&self, draft: MarkingDraft, created_by: &str) -> StoreResult<OemMarking> {
        let draft = draft.validate()?;
        let mut markings = self.markings.write();

        if markings
            .values()
            .any(|m| m.same_identity(&draft.manufacturer, &draft.ic_part_number))
        {
            return Err(StoreError::DuplicateMarking {
                manufacturer: draft.manufacturer,
                part_number: draft.ic_part_number,
            });
        }

        let marking = OemMarking::from_draft(draft, created_by, Utc::now());
        markings.insert(marking.id, marking.clone());
        self.bump();

        info!(id = %marking.id, name = %marking.display_name(), "OEM marking created");
        Ok(marking)
    }

    pub fn get(&self, id: MarkingId) -> StoreResult<OemMarking> {
        self.markings
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::MarkingNotFound(id))
    }

    /// Replaces the editable fields of `id`. Stats and creation audit are kept.
    pub fn update(
        &self,
        id: MarkingId,
        draft: MarkingDraft,
        updated_by: &str,
    ) -> StoreResult<OemMarking> {
        let draft = draft.validate()?;
        let mut markings = self.markings.write();

        if markings
            .values()
            .any(|m| m.id != id && m.same_identity(&draft.manufacturer, &draft.ic_part_number))
        {
            return Err(StoreError::DuplicateMarking {
                manufacturer: draft.manufacturer,
                part_number: draft.ic_part_number,
            });
        }

        let marking = markings.get_mut(&id).ok_or(StoreError::MarkingNotFound(id))?;
        marking.apply_draft(draft, updated_by, Utc::now());
        let updated = marking.clone();
        self.bump();

        debug!(%id, "OEM marking updated");
        Ok(updated)
    }

    /// Soft-deletes `id`. The record is kept for historical inspections.
    pub fn deactivate(&self, id: MarkingId, updated_by: &str) -> StoreResult<OemMarking> {
        let mut markings = self.markings.write();
        let marking = markings.get_mut(&id).ok_or(StoreError::MarkingNotFound(id))?;

        marking.is_active = false;
        marking.updated_by = Some(updated_by.to_string());
        marking.updated_at = Utc::now();
        let deactivated = marking.clone();
        self.bump();

        info!(%id, "OEM marking deactivated");
        Ok(deactivated)
    }

    /// Active markings matching `query`, newest first.
    pub fn list(&self, query: &MarkingQuery, page: PageRequest) -> Page<OemMarking> {
        let markings = self.markings.read();
        let mut hits: Vec<&OemMarking> = markings.values().filter(|m| query.matches(m)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        page.slice(hits.into_iter().cloned())
    }

    /// Distinct manufacturers of active markings, sorted.
    pub fn manufacturers(&self) -> Vec<String> {
        self.markings
            .read()
            .values()
            .filter(|m| m.is_active)
            .map(|m| m.manufacturer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> MarkingStats {
        let markings = self.markings.read();
        let active: Vec<&OemMarking> = markings.values().filter(|m| m.is_active).collect();
        if active.is_empty() {
            return MarkingStats::default();
        }

        let manufacturers: BTreeSet<&str> = active.iter().map(|m| m.manufacturer.as_str()).collect();
        let categories: BTreeSet<_> = active.iter().map(|m| m.category).collect();
        let package_types: BTreeSet<_> = active.iter().map(|m| m.package_type).collect();
        let total_usage: u64 = active.iter().map(|m| m.stats.times_used).sum();

        MarkingStats {
            total_markings: active.len() as u64,
            total_manufacturers: manufacturers.len() as u64,
            total_categories: categories.len() as u64,
            total_package_types: package_types.len() as u64,
            avg_times_used: round2(total_usage as f64 / active.len() as f64),
            total_usage,
        }
    }

    /// Snapshot of the active markings for the matcher.
    pub fn active_markings(&self) -> ActiveMarkings {
        let generation = self.generation();
        self.active.get_with(generation, || {
            let markings = self.markings.read();
            let snapshot: Vec<ReferenceMarking> = markings
                .values()
                .filter(|m| m.is_active)
                .map(OemMarking::reference)
                .collect();
            debug!(generation, count = snapshot.len(), "Active marking snapshot built");
            snapshot.into()
        })
    }

    /// Applies a verification outcome to the marking's usage stats.
    ///
    /// The increment happens under the write lock, so concurrent calls never
    /// lose updates. Inactive markings are still counted.
    pub fn record_usage(&self, id: MarkingId, outcome: UsageOutcome) -> StoreResult<UsageStats> {
        let mut markings = self.markings.write();
        let marking = markings.get_mut(&id).ok_or(StoreError::MarkingNotFound(id))?;
        marking.stats.record(outcome, Utc::now());
        debug!(%id, ?outcome, times_used = marking.stats.times_used, "Marking usage recorded");
        Ok(marking.stats.clone())
    }

    /// All markings, active or not, for persistence.
    pub fn all(&self) -> Vec<OemMarking> {
        let mut all: Vec<OemMarking> = self.markings.read().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.markings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.markings.read().is_empty()
    }
}
