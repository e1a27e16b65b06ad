use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vectors differ in length: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}
