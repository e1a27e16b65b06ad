//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use grader::config::Config;
use grader::gateway::{HandlerState, create_router_with_state};
use grader::index::ElementType;
use grader::pipeline::RagPipeline;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::fixtures::{PASSAGES, write_artifacts};

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

pub struct TestServer {
    pub addr: SocketAddr,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("/healthz did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Pipeline failed to load: {0}")]
    StartupFailed(String),
}

/// Polls `/healthz` until it answers 200 or `timeout` elapses.
async fn wait_for_healthz(addr: SocketAddr, timeout: Duration) -> Result<(), ServerStartupError> {
    let url = format!("http://{}/healthz", addr);
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if let Ok(response) = reqwest::get(&url).await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(STARTUP_POLL_INTERVAL_MS)).await;
    }
    Err(ServerStartupError::Timeout(timeout))
}

/// Spawns a server over the fixture corpus with stub models on an ephemeral port.
pub async fn spawn_test_server() -> Result<TestServer, ServerStartupError> {
    spawn_test_server_with(|_| {}).await
}

/// Like [`spawn_test_server`], letting the caller adjust the config before loading.
pub async fn spawn_test_server_with<F>(adjust: F) -> Result<TestServer, ServerStartupError>
where
    F: FnOnce(&mut Config),
{
    let temp_dir = TempDir::new()?;
    let artifacts = write_artifacts(temp_dir.path(), &PASSAGES, ElementType::F32);

    let mut config = artifacts.config();
    adjust(&mut config);
    config
        .validate()
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let pipeline =
        RagPipeline::load(&config).map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;
    let app = create_router_with_state(HandlerState::new(Arc::new(pipeline)));

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_healthz(local_addr, Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS)).await?;

    Ok(TestServer {
        addr: local_addr,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
        _temp_dir: temp_dir,
    })
}
