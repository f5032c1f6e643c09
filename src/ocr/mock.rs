//! In-process OCR backend.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::OcrBackend;
use super::error::OcrResult;
use super::types::{OcrAnalysis, OcrRequest};

/// Confidence reported for echoed file stems.
pub const MOCK_OCR_CONFIDENCE: f64 = 0.9;

/// Answers OCR requests without a network call.
///
/// Queued responses are returned first, in order. Once the queue is empty the
/// mock "reads" the upload's file stem, so `LM358N.png` yields `LM358N`.
#[derive(Debug)]
pub struct MockOcrBackend {
    scripted: Mutex<VecDeque<OcrResult<OcrAnalysis>>>,
    available: bool,
}

impl MockOcrBackend {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            available: true,
        }
    }

    /// A mock that reports itself unavailable to readiness probes.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queues the result returned by the next `analyze` call.
    pub fn push(&self, result: OcrResult<OcrAnalysis>) {
        self.scripted.lock().push_back(result);
    }

    /// Queues a successful reading.
    pub fn push_text(&self, text: &str, confidence: f64) {
        self.push(Ok(Self::reading(text, confidence)));
    }

    fn reading(text: &str, confidence: f64) -> OcrAnalysis {
        OcrAnalysis {
            extracted_text: text.to_string(),
            ocr_confidence: confidence,
            bounding_boxes: Vec::new(),
            alternatives: Vec::new(),
            preprocessing_steps: vec!["mock".to_string()],
            processing_time: 0.0,
        }
    }
}

impl Default for MockOcrBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrBackend for MockOcrBackend {
    async fn analyze(&self, request: OcrRequest) -> OcrResult<OcrAnalysis> {
        if let Some(result) = self.scripted.lock().pop_front() {
            return result.and_then(OcrAnalysis::validate);
        }

        let stem = Path::new(&request.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::reading(&stem, MOCK_OCR_CONFIDENCE))
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
