//! HTTP client helpers for tests.

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

/// Status code, `x-marksure-status` header and decoded JSON body.
#[derive(Debug)]
pub struct ApiReply {
    pub status: u16,
    pub marker: String,
    pub body: Value,
}

impl ApiReply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
    operator: Option<String>,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            operator: None,
        }
    }

    /// Sends `Authorization: Bearer <operator>` on every request.
    pub fn as_operator(mut self, operator: &str) -> Self {
        self.operator = Some(operator.to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.operator {
            Some(op) => builder.bearer_auth(op),
            None => builder,
        }
    }

    async fn reply(resp: reqwest::Response) -> Result<ApiReply, TestClientError> {
        let status = resp.status().as_u16();
        let marker = resp
            .headers()
            .get("x-marksure-status")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text)
            .map_err(|_| TestClientError::UnexpectedStatus(status, text))?;
        Ok(ApiReply {
            status,
            marker,
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<ApiReply, TestClientError> {
        let builder = self.add_headers(self.client.get(self.url(path)));
        Self::reply(builder.send().await?).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<ApiReply, TestClientError> {
        let builder = self.add_headers(self.client.post(self.url(path)));
        Self::reply(builder.json(body).send().await?).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<ApiReply, TestClientError> {
        let builder = self.add_headers(self.client.put(self.url(path)));
        Self::reply(builder.json(body).send().await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiReply, TestClientError> {
        let builder = self.add_headers(self.client.delete(self.url(path)));
        Self::reply(builder.send().await?).await
    }

    /// Posts `bytes` as the `image` part of an analyze request.
    pub async fn analyze(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
        fields: &[(&str, &str)],
    ) -> Result<ApiReply, TestClientError> {
        let image = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let mut form = Form::new().part("image", image);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let builder = self.add_headers(self.client.post(self.url("/api/inspections/analyze")));
        Self::reply(builder.multipart(form).send().await?).await
    }

    pub async fn health(&self) -> Result<ApiReply, TestClientError> {
        self.get("/healthz").await
    }

    pub async fn ready(&self) -> Result<ApiReply, TestClientError> {
        self.get("/ready").await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, String),
}
