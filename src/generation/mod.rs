//! Answer generation from a retrieved context.
//!
//! [`T5Generator`] runs a T5 encoder-decoder with candle's [`LogitsProcessor`]
//! (sampling by default, greedy when temperature is zero). Without a model
//! directory it falls back to an extractive stub that answers with the first
//! sentence of the context.
//!
//! [`LogitsProcessor`]: candle_transformers::generation::LogitsProcessor

pub mod config;
mod error;
pub mod prompt;
pub mod t5;


pub use config::{GeneratorConfig, SamplingConfig};
pub use error::GenerationError;
pub use prompt::Prompt;
pub use t5::{T5Generator, first_sentence};

/// Produces an answer for a rendered prompt.
///
/// Implementations are shared across request tasks and called from the
/// blocking pool.
pub trait TextGenerator: Send + Sync + 'static {
    fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;

    /// `true` when no real model backs the generator.
    fn is_stub(&self) -> bool {
        false
    }
}
