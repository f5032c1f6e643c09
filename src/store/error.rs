use std::path::PathBuf;

use thiserror::Error;

use crate::matching::MarkingId;

#[derive(Error, Debug)]
/// Errors returned by the marking and inspection stores.
pub enum StoreError {
    /// Input failed field validation. Messages are joined with `", "`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No marking with this id.
    #[error("OEM marking not found: {0}")]
    MarkingNotFound(MarkingId),

    /// No inspection with this id.
    #[error("inspection not found: {0}")]
    InspectionNotFound(String),

    /// A marking with the same manufacturer and part number exists.
    #[error("OEM marking with this manufacturer and part number already exists: {manufacturer} {part_number}")]
    DuplicateMarking {
        manufacturer: String,
        part_number: String,
    },

    /// The operation does not apply to the record in its current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot error at {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
