use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator model file missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load T5 model from {model_dir}: {reason}")]
    ModelLoadFailed { model_dir: PathBuf, reason: String },

    #[error("failed to load tokenizer from {model_dir}: {source}")]
    TokenizerLoadFailed {
        model_dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Encoding the prompt or decoding generated ids failed.
    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("decoding failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("invalid generator configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for GenerationError {
    fn from(err: candle_core::Error) -> Self {
        GenerationError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
