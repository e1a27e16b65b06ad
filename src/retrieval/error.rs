use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index search failed: {0}")]
    Index(#[from] IndexError),

    #[error("top_k must be between 1 and {max}, got {value}")]
    InvalidTopK { value: usize, max: usize },

    #[error("max_context_chars must be between 1 and {max}, got {value}")]
    InvalidContextChars { value: usize, max: usize },

    #[error("corpus has {corpus} passages but index has {index} vectors")]
    CorpusIndexMismatch { corpus: usize, index: usize },

    #[error("index position {position} outside corpus of {len} passages")]
    PositionOutOfRange { position: usize, len: usize },
}

impl RetrievalError {
    /// True for errors caused by caller input rather than server state.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            RetrievalError::InvalidTopK { .. } | RetrievalError::InvalidContextChars { .. }
        )
    }
}
