use thiserror::Error;

use crate::ocr::OcrError;
use crate::store::StoreError;

use super::record::Inspection;

#[derive(Debug, Error)]
pub enum InspectionError {
    /// The upload or its form fields failed validation.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("unsupported image type '{0}'")]
    UnsupportedMediaType(String),

    #[error("image of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The same image bytes were already inspected.
    #[error("this image has already been processed as {}", .0.inspection_id)]
    Duplicate(Box<Inspection>),

    /// Verification was requested before the analysis finished.
    #[error("inspection {0} is still being analyzed")]
    StillProcessing(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to store uploaded image: {0}")]
    Io(#[from] std::io::Error),
}

impl InspectionError {
    /// `true` if the same upload may succeed when sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InspectionError::Ocr(e) if e.is_unavailable())
    }
}

pub type InspectionResult<T> = Result<T, InspectionError>;
