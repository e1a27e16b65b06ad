//! RAG grader HTTP server entrypoint.
//!
//! `rag-grader` serves the API. `rag-grader --build-index [--f16]` embeds the
//! configured corpus and writes the index file instead. `--health-check`
//! probes a running server's `/healthz` and exits 0 or 1.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use grader::config::Config;
use grader::corpus::Corpus;
use grader::embedding::{EmbedderConfig, SentenceEmbedder};
use grader::gateway::{HandlerState, create_router_with_state};
use grader::index::{ElementType, Metric};
use grader::pipeline::{RagPipeline, build_index};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    if args.iter().any(|arg| arg == "--build-index") {
        let element = if args.iter().any(|arg| arg == "--f16") {
            ElementType::F16
        } else {
            ElementType::F32
        };
        return run_build_index(&config, element);
    }

    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        index = %config.index_path.display(),
        corpus = %config.corpus_path.display(),
        "RAG grader starting"
    );

    let pipeline = RagPipeline::load(&config).context("failed to load pipeline")?;
    let state = HandlerState::new(Arc::new(pipeline));
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("RAG grader shutdown complete");
    Ok(())
}

fn run_build_index(config: &Config, element: ElementType) -> anyhow::Result<()> {
    let embedder = SentenceEmbedder::load(EmbedderConfig::from_optional(
        config.embedding_model_path.clone(),
        config.device,
    ))?;
    if embedder.is_stub() {
        tracing::warn!("Building index with the STUB embedder; serve with the same setting");
    }

    let corpus = Corpus::load_csv(&config.corpus_path, &config.corpus_column)?;
    let index = build_index(&embedder, &corpus, Metric::L2)?;
    index
        .write_to(&config.index_path, element)
        .with_context(|| format!("failed to write {}", config.index_path.display()))?;

    tracing::info!(
        path = %config.index_path.display(),
        vectors = index.len(),
        dim = index.dim(),
        ?element,
        "Index written"
    );
    Ok(())
}

async fn run_health_check() -> i32 {
    let port = std::env::var("RAG_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);

    let url = format!("http://127.0.0.1:{}/healthz", port);

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
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
