//! Cross-cutting, shared constants.
//!
//! Classification thresholds live next to the decision table in
//! [`crate::classification::rules`]; this module holds the limits shared by the
//! store, the inspection workflow and the HTTP layer.

/// Maximum number of ranked alternatives kept beside the best match.
pub const MAX_ALTERNATIVES: usize = 4;

/// Default per-marking acceptance threshold.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.9;

/// Lowest per-marking acceptance threshold a reference marking may carry.
pub const MIN_SIMILARITY_FLOOR: f64 = 0.1;

/// OCR confidence below which an image is flagged for a retake.
pub const POOR_OCR_CONFIDENCE: f64 = 0.6;

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted upload content types.
pub const ALLOWED_IMAGE_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/bmp",
    "image/tiff",
];

/// Default analytics window when no explicit range is requested.
pub const DEFAULT_ANALYTICS_WINDOW_DAYS: i64 = 30;

/// Inspection records are kept for a year by default.
pub const RETENTION_DAYS: i64 = 365;

/// Upper bound for free-text notes on markings and inspections.
pub const MAX_NOTES_LEN: usize = 1000;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Version string recorded on inspections processed by the AI service.
pub const AI_SERVICE_VERSION: &str = "1.0.0";
