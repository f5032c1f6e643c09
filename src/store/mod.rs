//! Reference markings and inspection records.
//!
//! Both stores are in-memory tables behind `parking_lot` locks, persisted as a
//! single JSON [`Snapshot`]. A database opened with [`Database::open`] rewrites
//! the snapshot after every committed mutation, so a crash loses nothing a
//! caller was told succeeded.

pub mod error;
pub mod inspections;
pub mod markings;
pub mod model;
pub mod query;
pub mod snapshot;


use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

pub use error::{StoreError, StoreResult};
pub use inspections::{InspectionStore, Reservation};
pub use markings::{ActiveMarkings, MarkingStore};
pub use model::{
    Category, MarkingDraft, MarkingFont, MarkingFormat, MarkingSize, MarkingText, MarkingView,
    OemMarking, PackageType, UsageOutcome, UsageStats, ValidationRules,
};
pub use query::{
    HistoryQuery, InspectionAnalytics, MarkingQuery, MarkingStats, Page, PageRequest,
};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};

/// Serializes snapshot writes so a stale snapshot never lands after a newer one.
struct SnapshotWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Both stores, shared by the inspection service and the HTTP layer.
#[derive(Clone, Default)]
pub struct Database {
    pub markings: Arc<MarkingStore>,
    pub inspections: Arc<InspectionStore>,
    writer: Option<Arc<SnapshotWriter>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            markings: Arc::new(MarkingStore::from_markings(snapshot.markings)),
            inspections: Arc::new(InspectionStore::from_inspections(snapshot.inspections)),
            writer: None,
        }
    }

    /// Loads `path` and keeps it as the write-through target for [`Database::commit`].
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut db = Self::load(&path)?;
        db.writer = Some(Arc::new(SnapshotWriter {
            path,
            lock: Mutex::new(()),
        }));
        Ok(db)
    }

    /// Snapshot path written by [`Database::commit`], if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.writer.as_deref().map(|w| w.path.as_path())
    }

    /// Writes the current state to the snapshot path. No-op for a database
    /// that was not opened from a file.
    ///
    /// Every write captures both stores in full, so a failed commit is
    /// repaired by the next successful one.
    pub async fn commit(&self) -> StoreResult<()> {
        let Some(writer) = self.writer.clone() else {
            return Ok(());
        };
        let db = self.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let _guard = writer.lock.lock();
            db.snapshot().write(&writer.path)?;
            debug!(path = %writer.path.display(), "Snapshot committed");
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(io::Error::other(e)))?
    }

    /// Loads `path` if it exists, otherwise starts empty.
    pub fn load(path: &Path) -> StoreResult<Self> {
        match Snapshot::read(path)? {
            Some(snapshot) => {
                let db = Self::from_snapshot(snapshot);
                info!(
                    path = %path.display(),
                    markings = db.markings.len(),
                    inspections = db.inspections.len(),
                    "Snapshot loaded"
                );
                Ok(db)
            }
            None => {
                info!(path = %path.display(), "No snapshot found, starting empty");
                Ok(Self::new())
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            markings: self.markings.all(),
            inspections: self.inspections.all(),
        }
    }

    /// Atomically writes both stores to `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let snapshot = self.snapshot();
        snapshot.write(path)?;
        info!(
            path = %path.display(),
            markings = snapshot.markings.len(),
            inspections = snapshot.inspections.len(),
            "Snapshot saved"
        );
        Ok(())
    }
}
