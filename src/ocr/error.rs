use thiserror::Error;

/// Errors returned by [`OcrBackend`](super::OcrBackend) implementations.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The service could not be reached at all.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    /// The service did not answer within the configured timeout.
    #[error("AI service timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The service answered with a non-success status.
    #[error("AI service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The response body could not be decoded or failed validation.
    #[error("invalid AI service response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("failed to build AI service request: {0}")]
    Request(String),
}

impl OcrError {
    /// Returns `true` if the service was unreachable (as opposed to failing mid-call).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, OcrError::Unavailable(_))
    }
}

/// Convenience result type for OCR calls.
pub type OcrResult<T> = Result<T, OcrError>;
