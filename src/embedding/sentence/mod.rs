//! Sentence embedder (BERT + mean pooling).
//!
//! Use [`EmbedderConfig::stub`] for tests/examples without model files. The stub
//! hashes lowercase word tokens into a signed bag-of-words vector, so texts that
//! share words land closer together than texts that share none.

/// Embedder configuration.
pub mod config;


pub use config::EmbedderConfig;

use std::sync::Arc;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertSentenceEncoder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{load_tokenizer, missing_model_file};

enum EmbedderBackend {
    Model {
        encoder: Arc<BertSentenceEncoder>,
        tokenizer: Arc<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Shared embedding model used for both retrieval and answer comparison.
pub struct SentenceEmbedder {
    backend: EmbedderBackend,
    config: EmbedderConfig,
    dim: usize,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(dim = config.stub_dim, "Sentence embedder running in STUB mode");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                dim: config.stub_dim,
                config,
            });
        }

        if let Some(missing) = missing_model_file(&config.model_dir) {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_dir.join(missing),
            });
        }

        let device = select_device(config.device);
        debug!(?device, "Selected compute device for sentence embedder");

        let tokenizer = load_tokenizer(&config.model_dir, config.max_seq_len).map_err(|source| {
            EmbeddingError::TokenizerLoadFailed {
                model_dir: config.model_dir.clone(),
                source,
            }
        })?;

        let encoder = BertSentenceEncoder::load(&config.model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                model_dir: config.model_dir.clone(),
                reason: e.to_string(),
            }
        })?;
        let dim = encoder.hidden_size();

        info!(
            model_dir = %config.model_dir.display(),
            embedding_dim = dim,
            max_seq_len = config.max_seq_len,
            "Sentence embedding model loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                encoder: Arc::new(encoder),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
            dim,
        })
    }

    /// Shorthand for `load(EmbedderConfig::stub())`.
    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(EmbedderConfig::stub())
    }

    /// Embeds a single string into a unit-length vector (all zeros for token-free stub input).
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                encoder,
                tokenizer,
                device,
            } => self.embed_with_model(text, encoder, tokenizer, device),
            EmbedderBackend::Stub => Ok(self.embed_stub(text)),
        }
    }

    /// Embeds each string independently.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn embed_with_model(
        &self,
        text: &str,
        encoder: &BertSentenceEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    text_len: text.len(),
                    reason: e.to_string(),
                })?;

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Generating embedding"
        );

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = encoder
            .encode(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: e.to_string(),
            })?;

        let mut embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dim];

        for token in stub_tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes: [u8; 8] = hash.as_bytes()[..8]
                .try_into()
                .unwrap_or([0u8; 8]);
            let h = u64::from_le_bytes(bytes);

            let bucket = (h % self.dim as u64) as usize;
            let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
            embedding[bucket] += sign;
        }

        debug!(text_len = text.len(), "Generated stub embedding");

        l2_normalize(&mut embedding);
        embedding
    }

    /// Returns the output embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }
}

/// Lowercased alphanumeric words. Text without any falls back to its
/// non-whitespace chars, then to the raw text, so only `""` has no tokens.
fn stub_tokens(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect();
    if !words.is_empty() {
        return words;
    }

    let symbols: Vec<String> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(String::from)
        .collect();
    if !symbols.is_empty() || text.is_empty() {
        return symbols;
    }

    vec![text.to_string()]
}

fn l2_normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in embedding.iter_mut() {
            *x /= norm;
        }
    }
}
