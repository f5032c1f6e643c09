//! MarkSure library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Core decision logic
//! - [`text_similarity`] - normalized Levenshtein similarity between markings
//! - [`find_best_match`] - best reference marking plus ranked alternatives
//! - [`classify`] - the ordered decision table and the poor-OCR post-check
//! - [`hash_image`] - content hash used for duplicate detection
//!
//! ## Service
//! - [`InspectionService`] - upload, OCR, match, classify, persist
//! - [`Database`] - reference markings and inspection records
//! - [`OcrBackend`], [`HttpOcrClient`], [`MockOcrBackend`] - text extraction
//! - [`Config`], [`ConfigError`] - server configuration
//!
//! The HTTP surface lives in [`gateway`].

pub mod classification;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod hashing;
pub mod inspection;
pub mod matching;
pub mod ocr;
pub mod similarity;
pub mod store;

pub use classification::{
    Classification, ClassificationResult, Flag, Recommendation, RiskLevel, classify,
};
pub use config::{Config, ConfigError};
pub use hashing::{ImageHash, hash_image};
pub use inspection::{
    Inspection, InspectionError, InspectionResult, InspectionService, InspectionUpload,
    VerificationRequest,
};
pub use matching::{MarkingId, MatchResult, ReferenceMarking, find_best_match};
pub use ocr::{HttpOcrClient, MockOcrBackend, OcrBackend, OcrEngine, OcrError};
pub use similarity::text_similarity;
pub use store::{Database, OemMarking, StoreError};
