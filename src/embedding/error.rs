use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or running the sentence embedder.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// A required model file is absent (`config.json`, weights or tokenizer).
    #[error("embedding model file missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load sentence encoder from {model_dir}: {reason}")]
    ModelLoadFailed { model_dir: PathBuf, reason: String },

    #[error("failed to load tokenizer from {model_dir}: {source}")]
    TokenizerLoadFailed {
        model_dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to tokenize input of {text_len} bytes: {reason}")]
    TokenizationFailed { text_len: usize, reason: String },

    #[error("sentence encoder forward pass failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("invalid embedder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
