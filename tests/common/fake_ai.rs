//! Stand-in for the external OCR service, served by axum on an ephemeral port.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What `/analyze` answers with.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Reading { text: String, confidence: f64 },
    Status(u16, String),
    Raw(String),
    Stall(Duration),
}

impl FakeReply {
    pub fn reading(text: &str, confidence: f64) -> Self {
        FakeReply::Reading {
            text: text.to_string(),
            confidence,
        }
    }
}

/// One `/analyze` call as the fake saw it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedForm {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub image_len: usize,
    pub ocr_engine_type: Option<String>,
    pub inspection_id: Option<String>,
}

#[derive(Clone)]
struct FakeState {
    reply: FakeReply,
    received: Arc<Mutex<Vec<ReceivedForm>>>,
}

pub struct FakeAiService {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedForm>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeAiService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn received(&self) -> Vec<ReceivedForm> {
        self.received.lock().clone()
    }
}

impl Drop for FakeAiService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn analyze(State(state): State<FakeState>, mut multipart: Multipart) -> Response {
    let mut form = ReceivedForm::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                form.image_len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
            "ocr_engine_type" => form.ocr_engine_type = field.text().await.ok(),
            "inspection_id" => form.inspection_id = field.text().await.ok(),
            _ => {}
        }
    }
    state.received.lock().push(form);

    match state.reply {
        FakeReply::Reading { text, confidence } => Json(serde_json::json!({
            "extracted_text": text,
            "ocr_confidence": confidence,
            "bounding_boxes": [
                {"text": text, "confidence": confidence, "coordinates": {"x": 4, "y": 8, "width": 120, "height": 24}}
            ],
            "alternatives": [],
            "preprocessing_steps": ["grayscale", "denoise"],
            "processing_time": 0.42
        }))
        .into_response(),
        FakeReply::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        FakeReply::Raw(body) => (
            StatusCode::OK,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        FakeReply::Stall(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

pub async fn spawn_fake_ai_service(reply: FakeReply) -> std::io::Result<FakeAiService> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(FakeState {
            reply,
            received: received.clone(),
        });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    Ok(FakeAiService {
        addr,
        received,
        shutdown_tx: Some(shutdown_tx),
    })
}

/// An address nothing listens on.
pub async fn unused_addr() -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    listener.local_addr()
}
