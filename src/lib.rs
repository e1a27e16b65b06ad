//! RAG grader library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! - [`Config`], [`ConfigError`] - Environment-backed server configuration
//! - [`RagPipeline`] - Normalize, retrieve, assemble context and generate
//! - [`SentenceEmbedder`] - Shared embedding model (retrieval and comparison)
//! - [`FlatIndex`], [`Corpus`], [`Retriever`] - Nearest-neighbor retrieval
//! - [`T5Generator`], [`TextGenerator`] - Answer generation
//! - [`compare_answers`], [`cosine_similarity`] - Answer grading
//! - [`GraderClient`] - HTTP client for the API
//!
//! Model-backed components fall back to deterministic stubs when no model
//! directory is configured, so the whole service runs without model files.

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod corpus;
pub mod embedding;
pub mod gateway;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod scoring;
pub mod text;

pub use client::{ClientError, GraderClient};
pub use config::{Config, ConfigError};
pub use context::assemble_context;
pub use corpus::{Corpus, CorpusError};
pub use embedding::{DevicePreference, EmbedderConfig, EmbeddingError, SentenceEmbedder};
pub use gateway::{GatewayError, HandlerState, create_router_with_state};
pub use generation::{
    GenerationError, GeneratorConfig, Prompt, SamplingConfig, T5Generator, TextGenerator,
};
pub use index::{ElementType, FlatIndex, IndexError, Metric, SearchHit};
pub use pipeline::{GenerateOptions, GenerationOutcome, PipelineError, RagPipeline, build_index};
pub use retrieval::{RetrievalDefaults, RetrievalError, RetrievedPassage, Retriever};
pub use scoring::{ScoringError, compare_answers, cosine_similarity};
pub use text::normalize;
