//! The persisted inspection record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classification::{Classification, ClassificationResult};
use crate::constants::{AI_SERVICE_VERSION, RETENTION_DAYS};
use crate::hashing::ImageHash;
use crate::matching::{AlternativeMatch, MarkingId, MatchResult};
use crate::ocr::{BoundingBox, OcrAnalysis, OcrEngine};

/// Returns a fresh `INS-{unix millis}-{8 upper hex}` identifier.
pub fn generate_inspection_id(now: DateTime<Utc>) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!(
        "INS-{}-{}",
        now.timestamp_millis(),
        simple[..8].to_ascii_uppercase()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub original_name: String,
    /// Name of the stored copy under the uploads directory.
    pub filename: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    pub hash: ImageHash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInfo {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Wall time from start to end in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub ocr_engine: OcrEngine,
    #[serde(default)]
    pub preprocessing_steps: Vec<String>,
    pub ai_service_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResults {
    pub extracted_text: String,
    pub confidence: f64,
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
    pub language: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl From<OcrAnalysis> for OcrResults {
    fn from(analysis: OcrAnalysis) -> Self {
        Self {
            extracted_text: analysis.extracted_text,
            confidence: analysis.ocr_confidence,
            bounding_boxes: analysis.bounding_boxes,
            language: "en".to_string(),
            alternatives: analysis.alternatives,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    FuzzyMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityScores {
    pub text_similarity: f64,
    pub overall_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRecord {
    pub matched_oem: Option<MarkingId>,
    pub similarity: SimilarityScores,
    pub method: MatchMethod,
    #[serde(default)]
    pub alternative_matches: Vec<AlternativeMatch>,
}

impl From<&MatchResult> for MatchingRecord {
    fn from(result: &MatchResult) -> Self {
        Self {
            matched_oem: result.best_match_id(),
            similarity: SimilarityScores {
                text_similarity: result.similarity,
                overall_similarity: result.similarity,
            },
            method: MatchMethod::FuzzyMatch,
            alternative_matches: result.alternatives.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ImageQuality {
    /// Grades an image by pixel count: above 2 MP excellent, above 1 MP good,
    /// above 0.5 MP fair. Unknown dimensions grade as poor.
    pub fn from_resolution(dimensions: Option<Dimensions>) -> Self {
        match dimensions.map(|d| d.pixels()).unwrap_or(0) {
            p if p > 2_000_000 => ImageQuality::Excellent,
            p if p > 1_000_000 => ImageQuality::Good,
            p if p > 500_000 => ImageQuality::Fair,
            _ => ImageQuality::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub image_quality: ImageQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
    #[serde(
        rename = "agreesWithAI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub agrees_with_ai: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionSource {
    #[default]
    WebUpload,
    Api,
    BatchProcessing,
    CameraCapture,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionMetadata {
    pub source: InspectionSource,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One analyzed upload.
///
/// `result` is `None` only while the analysis is in flight; a finished record
/// always carries a verdict, possibly the analysis-error one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub inspection_id: String,
    pub image: ImageInfo,
    pub processing: ProcessingInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_results: Option<OcrResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingRecord>,
    #[serde(default)]
    pub result: Option<ClassificationResult>,
    pub quality: QualityAssessment,
    #[serde(default)]
    pub verification: Verification,
    pub metadata: InspectionMetadata,
    #[serde(default)]
    pub archived: bool,
    /// The analysis never reached the AI service, so this record no longer
    /// claims its image hash and the same bytes may be uploaded again.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    pub retention_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inspection {
    /// A pending record for an upload that has been hashed but not analyzed.
    pub fn pending(
        image: ImageInfo,
        ocr_engine: OcrEngine,
        metadata: InspectionMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        let quality = QualityAssessment {
            image_quality: ImageQuality::from_resolution(image.dimensions),
        };
        Self {
            inspection_id: generate_inspection_id(now),
            image,
            processing: ProcessingInfo {
                start_time: now,
                end_time: None,
                duration: None,
                ocr_engine,
                preprocessing_steps: Vec::new(),
                ai_service_version: AI_SERVICE_VERSION.to_string(),
            },
            ocr_results: None,
            matching: None,
            result: None,
            quality,
            verification: Verification::default(),
            metadata,
            archived: false,
            retryable: false,
            retention_date: now + Duration::days(RETENTION_DAYS),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    /// Records the verdict and closes the processing window.
    pub fn finish(&mut self, result: ClassificationResult, now: DateTime<Utc>) {
        self.result = Some(result);
        self.processing.end_time = Some(now);
        self.processing.duration = Some((now - self.processing.start_time).num_milliseconds());
        self.updated_at = now;
    }

    /// Closes the record with the analysis-error verdict.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.finish(ClassificationResult::analysis_error(), now);
    }

    /// Stores a human verdict beside the automated one.
    ///
    /// Returns `true` if this is the record's first verification.
    pub fn mark_verified(
        &mut self,
        verifier: &str,
        human_classification: Classification,
        human_confidence: Option<f64>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let first = !self.verification.verified;
        let agrees = self
            .result
            .as_ref()
            .map(|r| r.classification == human_classification);
        self.verification = Verification {
            verified: true,
            verified_by: Some(verifier.to_string()),
            verified_at: Some(now),
            human_classification: Some(human_classification),
            human_confidence,
            verification_notes: notes,
            agrees_with_ai: agrees,
        };
        self.updated_at = now;
        first
    }

    /// Overall similarity of the best match, if matching ran.
    pub fn overall_similarity(&self) -> Option<f64> {
        self.matching.as_ref().map(|m| m.similarity.overall_similarity)
    }

    /// Ordinal risk (1 = low .. 4 = critical), `0` while pending.
    pub fn risk_score(&self) -> u8 {
        self.result.as_ref().map_or(0, |r| r.risk_level.score())
    }
}
