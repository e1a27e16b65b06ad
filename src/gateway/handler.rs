use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::constants::{RAG_STATUS_HEADER, RAG_STATUS_OK};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    CompareRequest, CompareResponse, GenerateRequest, GenerateResponse,
};
use crate::gateway::state::HandlerState;
use crate::generation::TextGenerator;
use crate::pipeline::GenerateOptions;

#[instrument(skip(state, body), fields(question_len = tracing::field::Empty))]
pub async fn generate_handler<G: TextGenerator>(
    State(state): State<HandlerState<G>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let request: GenerateRequest = parse_body(body)?;
    tracing::Span::current().record("question_len", request.question.len());

    let options = GenerateOptions {
        top_k: request.top_k,
        max_context_chars: request.max_context_chars,
    };

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.generate(&request.question, options))
        .await
        .map_err(|e| GatewayError::InternalError(format!("Generation task failed: {}", e)))??;

    info!(
        retrieved = outcome.passages.len(),
        answer_len = outcome.answer.len(),
        "Answer generated"
    );
    debug!(positions = ?outcome.passages.iter().map(|p| p.position).collect::<Vec<_>>());

    Ok(json_ok(GenerateResponse {
        rag_answer: outcome.answer,
    }))
}

#[instrument(skip(state, body))]
pub async fn compare_handler<G: TextGenerator>(
    State(state): State<HandlerState<G>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let request: CompareRequest = parse_body(body)?;

    let pipeline = state.pipeline.clone();
    let score = tokio::task::spawn_blocking(move || {
        pipeline.compare(&request.rag_answer, &request.user_answer)
    })
    .await
    .map_err(|e| GatewayError::InternalError(format!("Comparison task failed: {}", e)))??;

    info!(cosine_similarity = score, "Answers compared");

    Ok(json_ok(CompareResponse {
        cosine_similarity: score,
    }))
}

/// Decodes a JSON body into `T`, turning every failure into a 400.
pub(crate) fn parse_body<T: DeserializeOwned>(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T, GatewayError> {
    let Json(value) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    serde_json::from_value(value)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))
}

pub(crate) fn json_ok<T: Serialize>(body: T) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(RAG_STATUS_HEADER, HeaderValue::from_static(RAG_STATUS_OK));
    (StatusCode::OK, headers, Json(body)).into_response()
}
