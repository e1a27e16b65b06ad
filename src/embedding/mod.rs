//! Embedding + model utilities.
//!
//! - [`sentence`] turns text into unit-length vectors for retrieval and comparison.
//! - [`device`] picks the compute device shared by every model in the process.

/// BERT encoder with mean pooling.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Sentence embedder.
pub mod sentence;
/// Tokenizer/model-directory helpers.
pub mod utils;

pub use device::{DevicePreference, select_device};
pub use error::EmbeddingError;
pub use sentence::{EmbedderConfig, SentenceEmbedder};
