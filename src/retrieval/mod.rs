//! Nearest-neighbor retrieval of corpus passages for a question.
//!
//! The [`Retriever`] pairs a [`FlatIndex`] with the [`Corpus`] it was built
//! from. The question is embedded with the shared [`SentenceEmbedder`], so the
//! index must hold vectors from the same model.

mod error;


pub use error::RetrievalError;

use tracing::debug;

use crate::constants::{
    DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MAX_REQUEST_CONTEXT_CHARS, DEFAULT_MAX_REQUEST_TOP_K,
    DEFAULT_TOP_K,
};
use crate::corpus::Corpus;
use crate::embedding::SentenceEmbedder;
use crate::index::FlatIndex;

/// Server-side retrieval defaults and the limits applied to caller overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalDefaults {
    pub top_k: usize,
    pub max_context_chars: usize,
    /// When `false`, request values are ignored and the defaults always apply.
    pub honor_request_params: bool,
    pub max_request_top_k: usize,
    pub max_request_context_chars: usize,
}

impl Default for RetrievalDefaults {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            honor_request_params: true,
            max_request_top_k: DEFAULT_MAX_REQUEST_TOP_K,
            max_request_context_chars: DEFAULT_MAX_REQUEST_CONTEXT_CHARS,
        }
    }
}

/// Effective per-request retrieval parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalParams {
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl RetrievalDefaults {
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be at least 1".to_string());
        }
        if self.max_context_chars == 0 {
            return Err("max_context_chars must be at least 1".to_string());
        }
        if self.max_request_top_k < self.top_k {
            return Err(format!(
                "max_request_top_k ({}) must be >= top_k ({})",
                self.max_request_top_k, self.top_k
            ));
        }
        if self.max_request_context_chars < self.max_context_chars {
            return Err(format!(
                "max_request_context_chars ({}) must be >= max_context_chars ({})",
                self.max_request_context_chars, self.max_context_chars
            ));
        }
        Ok(())
    }

    /// Merges caller-supplied values over the defaults.
    ///
    /// Missing values fall back to the defaults. Out-of-range values are an
    /// error, unless overrides are disabled, in which case they are ignored.
    pub fn resolve(
        &self,
        top_k: Option<usize>,
        max_context_chars: Option<usize>,
    ) -> Result<RetrievalParams, RetrievalError> {
        if !self.honor_request_params {
            return Ok(RetrievalParams {
                top_k: self.top_k,
                max_context_chars: self.max_context_chars,
            });
        }

        let top_k = top_k.unwrap_or(self.top_k);
        if !(1..=self.max_request_top_k).contains(&top_k) {
            return Err(RetrievalError::InvalidTopK {
                value: top_k,
                max: self.max_request_top_k,
            });
        }

        let max_context_chars = max_context_chars.unwrap_or(self.max_context_chars);
        if !(1..=self.max_request_context_chars).contains(&max_context_chars) {
            return Err(RetrievalError::InvalidContextChars {
                value: max_context_chars,
                max: self.max_request_context_chars,
            });
        }

        Ok(RetrievalParams {
            top_k,
            max_context_chars,
        })
    }
}

/// One retrieved passage. `rank` 0 is the most relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    pub rank: usize,
    pub position: usize,
    pub distance: f32,
    pub text: String,
}

#[derive(Debug)]
pub struct Retriever {
    corpus: Corpus,
    index: FlatIndex,
}

impl Retriever {
    /// Pairs an index with its corpus. Both must hold the same number of entries.
    pub fn new(corpus: Corpus, index: FlatIndex) -> Result<Self, RetrievalError> {
        if corpus.len() != index.len() {
            return Err(RetrievalError::CorpusIndexMismatch {
                corpus: corpus.len(),
                index: index.len(),
            });
        }
        Ok(Self { corpus, index })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Embeds an already-normalized question and returns its nearest passages.
    pub fn retrieve(
        &self,
        embedder: &SentenceEmbedder,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidTopK {
                value: top_k,
                max: self.index.len(),
            });
        }

        let query = embedder.embed(question)?;
        self.retrieve_by_vector(&query, top_k)
    }

    /// Returns the passages nearest to `query`, most relevant first.
    pub fn retrieve_by_vector(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let hits = self.index.search(query, top_k)?;

        let passages = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| -> Result<RetrievedPassage, RetrievalError> {
                let text = self
                    .corpus
                    .get(hit.position)
                    .ok_or(RetrievalError::PositionOutOfRange {
                        position: hit.position,
                        len: self.corpus.len(),
                    })?;
                Ok(RetrievedPassage {
                    rank,
                    position: hit.position,
                    distance: hit.distance,
                    text: text.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            requested = top_k,
            returned = passages.len(),
            best_distance = passages.first().map(|p| p.distance),
            "Retrieved passages"
        );

        Ok(passages)
    }
}
