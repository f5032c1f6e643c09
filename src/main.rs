//! MarkSure HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use marksure::config::Config;
use marksure::gateway::{HandlerState, create_router_with_state};
use marksure::inspection::InspectionService;
use marksure::ocr::{HttpOcrClient, MockOcrBackend, OcrBackend};
use marksure::store::Database;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!(
        r#"
  __  __            _     ____
 |  \/  | __ _ _ __| | __/ ___| _   _ _ __ ___
 | |\/| |/ _` | '__| |/ /\___ \| | | | '__/ _ \
 | |  | | (_| | |  |   <  ___) | |_| | | |  __/
 |_|  |_|\__,_|_|  |_|\_\|____/ \__,_|_|  \___|

        READ. MATCH. FLAG.
                                        AGPL-3.0
"#
    );

    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        storage = %config.storage_path.display(),
        "MarkSure starting"
    );

    tokio::fs::create_dir_all(&config.storage_path).await?;
    let db = Database::open(config.snapshot_path())?;

    let ocr: Arc<dyn OcrBackend> = if config.mock_ocr {
        tracing::warn!("MARKSURE_MOCK_OCR set, using the in-process OCR backend");
        Arc::new(MockOcrBackend::new())
    } else {
        tracing::info!(url = %config.ai_service_url, timeout = ?config.ai_timeout, "Using AI service");
        Arc::new(HttpOcrClient::new(
            config.ai_service_url.clone(),
            config.ai_timeout,
        )?)
    };

    let service = InspectionService::new(
        db.clone(),
        ocr,
        config.uploads_dir(),
        config.max_upload_bytes,
    );
    let state = HandlerState::new(service, config.storage_path.clone());
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Writing snapshot...");
    if let Err(e) = db.commit().await {
        tracing::error!(error = %e, "Failed to write snapshot");
        return Err(e.into());
    }

    tracing::info!("MarkSure shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("MARKSURE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
