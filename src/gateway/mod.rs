//! HTTP gateway (Axum) exposing `/generate` and `/compare`.
//!
//! Handlers decode bodies themselves so that every malformed request gets the
//! same JSON error shape, then run the pipeline on the blocking pool.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{compare_handler, generate_handler};
pub use state::HandlerState;

use crate::constants::{RAG_STATUS_HEADER, RAG_STATUS_OK, RAG_STATUS_READY};
use crate::generation::TextGenerator;

pub fn create_router_with_state<G: TextGenerator>(state: HandlerState<G>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<G>))
        .route("/generate", post(generate_handler::<G>))
        .route("/compare", post(compare_handler::<G>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ReadyResponse {
    pub status: String,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ComponentStatus {
    pub corpus_passages: usize,
    pub index_dim: usize,
    pub embedder_mode: String,
    pub generator_mode: String,
}

fn mode(is_stub: bool) -> String {
    let label = if is_stub { "stub" } else { "model" };
    label.to_string()
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(RAG_STATUS_HEADER, HeaderValue::from_static(RAG_STATUS_OK));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse {
            status: RAG_STATUS_OK.to_string(),
        }),
    )
        .into_response()
}

/// Reports the loaded artifacts. Startup only serves once everything loaded,
/// so a reachable server is always ready.
#[tracing::instrument(skip(state))]
pub async fn ready_handler<G: TextGenerator>(State(state): State<HandlerState<G>>) -> Response {
    let pipeline = &state.pipeline;

    let components = ComponentStatus {
        corpus_passages: pipeline.retriever().corpus().len(),
        index_dim: pipeline.retriever().index().dim(),
        embedder_mode: mode(pipeline.embedder().is_stub()),
        generator_mode: mode(pipeline.generator().is_stub()),
    };

    let mut headers = HeaderMap::new();
    headers.insert(RAG_STATUS_HEADER, HeaderValue::from_static(RAG_STATUS_READY));

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: RAG_STATUS_OK.to_string(),
            components,
        }),
    )
        .into_response()
}
