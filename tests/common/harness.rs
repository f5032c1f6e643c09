//! Test server harness.

use marksure::constants::DEFAULT_MAX_UPLOAD_BYTES;
use marksure::gateway::{HandlerState, create_router_with_state};
use marksure::inspection::InspectionService;
use marksure::ocr::{MockOcrBackend, OcrBackend};
use marksure::store::Database;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

#[derive(Clone)]
pub struct TestServerConfig {
    pub port: u16,
    pub storage_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Defaults to a fresh [`MockOcrBackend`].
    pub ocr: Option<Arc<dyn OcrBackend>>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            storage_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr: None,
        }
    }
}

impl TestServerConfig {
    pub fn with_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(ocr);
        self
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub db: Database,
    pub storage_path: PathBuf,
    server_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: Option<TempDir>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Kills the server task without the final snapshot write, the way a
    /// crash would.
    pub async fn kill(mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.shutdown_tx.take();
    }

    /// Stops the server and waits for its snapshot to be written.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Spawns a server wired the way the binary wires it: the database is opened
/// on `{storage}/snapshot.json`, committed after every mutation and once more
/// on shutdown.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let (storage_path, _temp_dir) = if let Some(path) = config.storage_path {
        (path, None)
    } else {
        let temp_dir =
            TempDir::new().map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;
        (temp_dir.path().to_path_buf(), Some(temp_dir))
    };
    std::fs::create_dir_all(&storage_path)
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let db = Database::open(storage_path.join("snapshot.json"))
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let ocr = config
        .ocr
        .unwrap_or_else(|| Arc::new(MockOcrBackend::new()));
    let service = InspectionService::new(
        db.clone(),
        ocr,
        storage_path.join("uploads"),
        config.max_upload_bytes,
    );
    let app = create_router_with_state(HandlerState::new(service, storage_path.clone()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_db = db.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        server_db.commit().await.unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        db,
        storage_path,
        server_handle: Some(server_handle),
        shutdown_tx: Some(shutdown_tx),
        _temp_dir,
    })
}
