//! HTTP client for the AI service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use super::OcrBackend;
use super::error::{OcrError, OcrResult};
use super::types::{OcrAnalysis, OcrRequest};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Posts images to `{base_url}/analyze` as multipart form data.
#[derive(Debug, Clone)]
pub struct HttpOcrClient {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl HttpOcrClient {
    /// Creates a client whose `/analyze` calls are bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> OcrResult<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify_send_error(&self, err: reqwest::Error) -> OcrError {
        if err.is_timeout() {
            OcrError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            OcrError::Unavailable(err.to_string())
        } else {
            OcrError::Request(err.to_string())
        }
    }

    fn build_form(request: OcrRequest) -> OcrResult<Form> {
        let image = Part::bytes(request.image)
            .file_name(request.file_name)
            .mime_str(&request.mime_type)
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Form::new()
            .part("image", image)
            .text("ocr_engine_type", request.engine.as_str())
            .text("inspection_id", request.inspection_id))
    }
}

#[async_trait]
impl OcrBackend for HttpOcrClient {
    #[tracing::instrument(skip(self, request), fields(inspection_id = %request.inspection_id, engine = %request.engine))]
    async fn analyze(&self, request: OcrRequest) -> OcrResult<OcrAnalysis> {
        let url = format!("{}/analyze", self.base_url);
        let form = Self::build_form(request)?;

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!(status = status.as_u16(), "AI service rejected analysis");
            return Err(OcrError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let analysis: OcrAnalysis = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                OcrError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                OcrError::InvalidResponse(e.to_string())
            }
        })?;

        let analysis = analysis.validate()?;
        debug!(
            ocr_confidence = analysis.ocr_confidence,
            chars = analysis.extracted_text.len(),
            "OCR analysis received"
        );
        Ok(analysis)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "AI service health probe failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
