use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use image::ImageReader;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::classification::{Classification, classify};
use crate::constants::{ALLOWED_IMAGE_MIME_TYPES, MAX_NOTES_LEN};
use crate::hashing::hash_image;
use crate::matching::find_best_match;
use crate::ocr::{OcrBackend, OcrEngine, OcrRequest};
use crate::store::{Database, Reservation, UsageOutcome};

use super::error::{InspectionError, InspectionResult};
use super::record::{Dimensions, ImageInfo, Inspection, InspectionMetadata, MatchingRecord};

/// An uploaded image plus the form fields sent with it.
#[derive(Debug, Clone, Default)]
pub struct InspectionUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub engine: OcrEngine,
    pub operator: String,
    pub location: Option<String>,
    pub station: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// A reviewer's independent verdict.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub human_classification: Classification,
    #[serde(default)]
    pub human_confidence: Option<f64>,
    #[serde(default, alias = "notes")]
    pub verification_notes: Option<String>,
}

impl VerificationRequest {
    fn validate(&self) -> InspectionResult<()> {
        if let Some(c) = self.human_confidence
            && (!c.is_finite() || !(0.0..=1.0).contains(&c))
        {
            return Err(InspectionError::InvalidUpload(
                "humanConfidence must be between 0 and 1".to_string(),
            ));
        }
        check_notes(self.verification_notes.as_deref())
    }
}

fn check_notes(notes: Option<&str>) -> InspectionResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(InspectionError::InvalidUpload(
            format!("notes must be at most {MAX_NOTES_LEN} characters long"),
        )),
        _ => Ok(()),
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        _ => "jpg",
    }
}

/// Reads width and height from the image header. `None` if the format is not recognised.
fn read_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
        .map(|(width, height)| Dimensions { width, height })
}

/// Runs analyses and verifications against a [`Database`].
#[derive(Clone)]
pub struct InspectionService {
    db: Database,
    ocr: Arc<dyn OcrBackend>,
    uploads_dir: PathBuf,
    max_upload_bytes: usize,
}

impl InspectionService {
    pub fn new(
        db: Database,
        ocr: Arc<dyn OcrBackend>,
        uploads_dir: PathBuf,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            ocr,
            uploads_dir,
            max_upload_bytes,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn ocr(&self) -> &Arc<dyn OcrBackend> {
        &self.ocr
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    fn check_upload(&self, upload: &InspectionUpload) -> InspectionResult<String> {
        if upload.bytes.is_empty() {
            return Err(InspectionError::InvalidUpload(
                "No image file uploaded".to_string(),
            ));
        }
        let mime = upload.mime_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_MIME_TYPES.contains(&mime.as_str()) {
            return Err(InspectionError::UnsupportedMediaType(upload.mime_type.clone()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(InspectionError::PayloadTooLarge {
                size: upload.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }
        check_notes(upload.notes.as_deref())?;
        Ok(mime)
    }

    /// Analyzes one upload end to end and returns the finished record.
    ///
    /// Fails with [`InspectionError::Duplicate`] if the bytes were seen before.
    /// Any failure after the record is reserved leaves it finished with the
    /// analysis-error verdict. If the AI service was unreachable the record also
    /// gives up its image hash, so the same bytes can be retried.
    #[instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.bytes.len()))]
    pub async fn analyze(&self, upload: InspectionUpload) -> InspectionResult<Inspection> {
        let mime = self.check_upload(&upload)?;
        let now = Utc::now();
        let hash = hash_image(&upload.bytes);
        let dimensions = read_dimensions(&upload.bytes);
        let filename = format!(
            "ic-image-{}-{}.{}",
            now.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            extension_for(&mime)
        );

        let image = ImageInfo {
            original_name: upload.file_name.clone(),
            filename,
            size: upload.bytes.len() as u64,
            mimetype: mime.clone(),
            dimensions,
            hash,
        };
        let metadata = InspectionMetadata {
            operator: upload.operator.clone(),
            location: upload.location.clone(),
            station: upload.station.clone(),
            notes: upload.notes.clone(),
            tags: upload.tags.clone(),
            ..Default::default()
        };
        let mut record = Inspection::pending(image, upload.engine, metadata, now);

        if let Reservation::Duplicate(existing) = self.db.inspections.reserve(record.clone()) {
            info!(%hash, existing = %existing.inspection_id, "Duplicate upload rejected");
            return Err(InspectionError::Duplicate(existing));
        }
        debug!(inspection_id = %record.inspection_id, %hash, "Inspection reserved");

        match self.run_pipeline(&mut record, upload, mime).await {
            Ok(()) => {
                self.db.inspections.save(record.clone())?;
                self.db.commit().await?;
                info!(
                    inspection_id = %record.inspection_id,
                    classification = %record.result.as_ref().map_or("pending", |r| r.classification.as_str()),
                    "Inspection completed"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(inspection_id = %record.inspection_id, error = %e, "Inspection analysis failed");
                let inspection_id = record.inspection_id.clone();
                record.fail(Utc::now());
                if let Err(save_err) = self.db.inspections.save(record) {
                    warn!(error = %save_err, "Failed to persist analysis-error verdict");
                } else if e.is_retryable()
                    && let Err(release_err) = self.db.inspections.release(&inspection_id)
                {
                    warn!(error = %release_err, "Failed to release image hash");
                }
                if let Err(commit_err) = self.db.commit().await {
                    error!(error = %commit_err, "Failed to commit analysis-error verdict");
                }
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        record: &mut Inspection,
        upload: InspectionUpload,
        mime_type: String,
    ) -> InspectionResult<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::write(self.uploads_dir.join(&record.image.filename), &upload.bytes).await?;

        let analysis = self
            .ocr
            .analyze(OcrRequest {
                inspection_id: record.inspection_id.clone(),
                file_name: upload.file_name,
                mime_type,
                engine: upload.engine,
                image: upload.bytes,
            })
            .await?;

        let active = self.db.markings.active_markings();
        let matched = find_best_match(&analysis.extracted_text, active.iter());
        let verdict = classify(matched.similarity, analysis.ocr_confidence);

        record.processing.preprocessing_steps = analysis.preprocessing_steps.clone();
        record.matching = Some(MatchingRecord::from(&matched));
        record.ocr_results = Some(analysis.into());
        record.finish(verdict, Utc::now());
        Ok(())
    }

    pub fn get(&self, inspection_id: &str) -> InspectionResult<Inspection> {
        Ok(self.db.inspections.get(inspection_id)?)
    }

    /// Records a human verdict and, on first verification, feeds it back into
    /// the matched marking's usage stats.
    #[instrument(skip(self, request))]
    pub async fn verify(
        &self,
        inspection_id: &str,
        request: VerificationRequest,
        verifier: &str,
    ) -> InspectionResult<Inspection> {
        request.validate()?;

        let (inspection, first) = self.db.inspections.update(inspection_id, |record| {
            if record.is_pending() {
                return Ok(None);
            }
            let first = record.mark_verified(
                verifier,
                request.human_classification,
                request.human_confidence,
                request.verification_notes.clone(),
                Utc::now(),
            );
            Ok(Some((record.clone(), first)))
        })?
        .ok_or_else(|| InspectionError::StillProcessing(inspection_id.to_string()))?;

        let matched = inspection.matching.as_ref().and_then(|m| m.matched_oem);
        if let (true, Some(marking_id), Some(agrees)) =
            (first, matched, inspection.verification.agrees_with_ai)
        {
            let outcome = if agrees {
                UsageOutcome::CorrectDetection
            } else {
                UsageOutcome::FalsePositive
            };
            if let Err(e) = self.db.markings.record_usage(marking_id, outcome) {
                warn!(%marking_id, error = %e, "Could not record marking usage");
            }
        }
        self.db.commit().await?;

        info!(
            inspection_id,
            human = %request.human_classification,
            agrees_with_ai = ?inspection.verification.agrees_with_ai,
            "Inspection verified"
        );
        Ok(inspection)
    }
}
