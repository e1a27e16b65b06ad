use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::RAG_STATUS_HEADER;
use crate::gateway::payload::ErrorResponse;
use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("scoring failed: {0}")]
    ScoringFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<PipelineError> for GatewayError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidRequest(reason) => GatewayError::InvalidRequest(reason),
            PipelineError::Embedding(e) => GatewayError::EmbeddingFailed(e.to_string()),
            e @ (PipelineError::Retrieval(_)
            | PipelineError::Index(_)
            | PipelineError::Corpus(_)) => GatewayError::RetrievalFailed(e.to_string()),
            PipelineError::Generation(e) => GatewayError::GenerationFailed(e.to_string()),
            PipelineError::Scoring(e) => GatewayError::ScoringFailed(e.to_string()),
            e @ PipelineError::DimensionMismatch { .. } => {
                GatewayError::InternalError(e.to_string())
            }
        }
    }
}

impl GatewayError {
    /// Value of the status header for this failure class.
    pub fn status_label(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::EmbeddingFailed(_) => "embedding_error",
            GatewayError::RetrievalFailed(_) => "retrieval_error",
            GatewayError::GenerationFailed(_) => "generation_error",
            GatewayError::ScoringFailed(_) => "scoring_error",
            GatewayError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut headers = HeaderMap::new();
        headers.insert(
            RAG_STATUS_HEADER,
            HeaderValue::from_static(self.status_label()),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
