use thiserror::Error;

use crate::corpus::CorpusError;
use crate::embedding::EmbeddingError;
use crate::generation::GenerationError;
use crate::index::IndexError;
use crate::retrieval::RetrievalError;
use crate::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval failed: {0}")]
    Retrieval(RetrievalError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("index dimension {index} does not match embedding dimension {embedder}")]
    DimensionMismatch { index: usize, embedder: usize },
}

impl From<RetrievalError> for PipelineError {
    fn from(err: RetrievalError) -> Self {
        if err.is_invalid_request() {
            PipelineError::InvalidRequest(err.to_string())
        } else {
            PipelineError::Retrieval(err)
        }
    }
}
