//! The inspection workflow.
//!
//! An upload is hashed and reserved in the store before anything slow happens,
//! so a second upload of the same bytes is turned away with the first record.
//! The reserved record is then always finished: with a verdict when OCR,
//! matching and classification succeed, with the analysis-error verdict when
//! anything after the reservation fails.

pub mod error;
pub mod record;
pub mod service;


pub use error::{InspectionError, InspectionResult};
pub use record::{
    Dimensions, ImageInfo, ImageQuality, Inspection, InspectionMetadata, InspectionSource,
    MatchMethod, MatchingRecord, OcrResults, ProcessingInfo, QualityAssessment, SimilarityScores,
    Verification, generate_inspection_id,
};
pub use service::{InspectionService, InspectionUpload, VerificationRequest};
