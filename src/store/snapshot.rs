//! JSON snapshot of both stores.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inspection::Inspection;

use super::error::{StoreError, StoreResult};
use super::model::OemMarking;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub markings: Vec<OemMarking>,
    #[serde(default)]
    pub inspections: Vec<Inspection>,
}

impl Snapshot {
    /// Reads a snapshot; `Ok(None)` if `path` does not exist.
    pub fn read(path: &Path) -> StoreResult<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Snapshot {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported version {} (expected {SNAPSHOT_VERSION})",
                    snapshot.version
                ),
            });
        }

        Ok(Some(snapshot))
    }

    /// Writes to a temp file in the target directory, syncs, then renames over `path`.
    pub fn write(&self, path: &Path) -> StoreResult<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec_pretty(self).map_err(|e| StoreError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}
