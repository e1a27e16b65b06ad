//! Cross-cutting, shared constants.
//!
//! Runtime overrides live in [`crate::config::Config`]; these are the defaults it falls back to.

/// Passages retrieved per question when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 3;

/// Per-passage character cap applied while assembling the context.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 400;

/// Upper bound accepted for a caller-supplied `top_k`.
pub const DEFAULT_MAX_REQUEST_TOP_K: usize = 10;

/// Upper bound accepted for a caller-supplied `max_context_chars`.
pub const DEFAULT_MAX_REQUEST_CONTEXT_CHARS: usize = 1200;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_MAX_NEW_TOKENS: usize = 80;

/// Output dimension of the stub embedder (matches MiniLM-class sentence encoders).
pub const STUB_EMBEDDING_DIM: usize = 384;

/// Max tokens fed to the BERT sentence encoder.
pub const EMBEDDING_MAX_SEQ_LEN: usize = 512;

/// Max tokens fed to the T5 encoder.
pub const GENERATOR_MAX_INPUT_TOKENS: usize = 512;

/// Decimal places kept in a reported similarity score.
pub const SIMILARITY_DECIMALS: i32 = 4;

/// First line of every generation prompt.
pub const PROMPT_INSTRUCTION: &str = "Answer the question based on the context below.";

/// Response header carrying the outcome class of a request.
pub const RAG_STATUS_HEADER: &str = "x-rag-status";

pub const RAG_STATUS_OK: &str = "ok";
pub const RAG_STATUS_READY: &str = "ready";
