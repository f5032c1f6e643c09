//! Client side of the external OCR service.
//!
//! The inspection pipeline talks to OCR through [`OcrBackend`]. Production uses
//! [`HttpOcrClient`], which posts the image to the AI service's `/analyze`
//! endpoint; [`MockOcrBackend`] answers in-process for local runs and tests.

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

use async_trait::async_trait;

pub use client::HttpOcrClient;
pub use error::{OcrError, OcrResult};
pub use mock::MockOcrBackend;
pub use types::{BoundingBox, BoxCoordinates, OcrAnalysis, OcrEngine, OcrRequest};

#[async_trait]
/// Text extraction from an uploaded IC image.
pub trait OcrBackend: Send + Sync {
    /// Runs OCR on `request.image` and returns a validated analysis.
    async fn analyze(&self, request: OcrRequest) -> OcrResult<OcrAnalysis>;

    /// Returns `true` if the backend can currently serve requests.
    async fn is_available(&self) -> bool;

    /// Short label for logs and the readiness endpoint.
    fn name(&self) -> &'static str;
}
