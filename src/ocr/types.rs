use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{OcrError, OcrResult};

/// OCR engine requested from the AI service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    #[default]
    Easyocr,
    Tesseract,
    Paddleocr,
    Ensemble,
}

impl OcrEngine {
    pub const ALL: [OcrEngine; 4] = [
        OcrEngine::Easyocr,
        OcrEngine::Tesseract,
        OcrEngine::Paddleocr,
        OcrEngine::Ensemble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrEngine::Easyocr => "easyocr",
            OcrEngine::Tesseract => "tesseract",
            OcrEngine::Paddleocr => "paddleocr",
            OcrEngine::Ensemble => "ensemble",
        }
    }
}

impl fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OcrEngine::ALL
            .into_iter()
            .find(|engine| engine.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown OCR engine: {s}"))
    }
}

/// One image sent for analysis.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub inspection_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub engine: OcrEngine,
    pub image: Vec<u8>,
}

/// Pixel rectangle of a detected text region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxCoordinates {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// A text region reported by the OCR engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub coordinates: BoxCoordinates,
}

/// Decoded `/analyze` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrAnalysis {
    pub extracted_text: String,
    pub ocr_confidence: f64,
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub preprocessing_steps: Vec<String>,
    /// Seconds spent inside the AI service.
    #[serde(default)]
    pub processing_time: f64,
}

impl OcrAnalysis {
    /// Rejects confidences that are non-finite or outside `[0, 1]`.
    pub fn validate(self) -> OcrResult<Self> {
        let c = self.ocr_confidence;
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(OcrError::InvalidResponse(format!(
                "ocr_confidence {c} outside [0, 1]"
            )));
        }
        Ok(self)
    }
}
