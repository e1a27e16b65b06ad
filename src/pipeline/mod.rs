//! The request pipeline: normalize, retrieve, assemble, prompt, generate.
//!
//! [`RagPipeline`] is built once at startup and shared (read-only) by every
//! request handler.

mod error;


pub use error::PipelineError;

use tracing::{debug, info};

use crate::config::Config;
use crate::context::assemble_from_retrieved;
use crate::corpus::Corpus;
use crate::embedding::{EmbedderConfig, SentenceEmbedder};
use crate::generation::{GeneratorConfig, Prompt, T5Generator, TextGenerator};
use crate::index::{FlatIndex, Metric};
use crate::retrieval::{RetrievalDefaults, RetrievedPassage, Retriever};
use crate::scoring::compare_answers;
use crate::text::normalize;

/// Per-request overrides. `None` uses the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub top_k: Option<usize>,
    pub max_context_chars: Option<usize>,
}

/// Everything one generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub answer: String,
    pub normalized_question: String,
    pub passages: Vec<RetrievedPassage>,
    pub context: String,
    pub prompt: Prompt,
}

#[derive(Debug)]
pub struct RagPipeline<G: TextGenerator = T5Generator> {
    embedder: SentenceEmbedder,
    retriever: Retriever,
    generator: G,
    defaults: RetrievalDefaults,
}

impl RagPipeline<T5Generator> {
    /// Opens every artifact named by `config` and loads both models.
    pub fn load(config: &Config) -> Result<Self, PipelineError> {
        let embedder = SentenceEmbedder::load(EmbedderConfig::from_optional(
            config.embedding_model_path.clone(),
            config.device,
        ))?;

        let index = FlatIndex::open(&config.index_path)?;
        let corpus = Corpus::load_csv(&config.corpus_path, &config.corpus_column)?;
        let retriever = Retriever::new(corpus, index)?;

        let generator = T5Generator::load(
            GeneratorConfig::from_optional(config.generator_model_path.clone(), config.device)
                .with_sampling(config.sampling),
        )?;

        let pipeline = Self::new(embedder, retriever, generator, config.retrieval)?;

        info!(
            passages = pipeline.retriever.corpus().len(),
            embedding_dim = pipeline.embedder.embedding_dim(),
            embedder_stub = pipeline.embedder.is_stub(),
            generator_stub = pipeline.generator.is_stub(),
            "Pipeline ready"
        );

        Ok(pipeline)
    }
}

impl<G: TextGenerator> RagPipeline<G> {
    /// Assembles a pipeline. The index must hold vectors of the embedder's dimension.
    pub fn new(
        embedder: SentenceEmbedder,
        retriever: Retriever,
        generator: G,
        defaults: RetrievalDefaults,
    ) -> Result<Self, PipelineError> {
        let index_dim = retriever.index().dim();
        if index_dim != embedder.embedding_dim() {
            return Err(PipelineError::DimensionMismatch {
                index: index_dim,
                embedder: embedder.embedding_dim(),
            });
        }

        Ok(Self {
            embedder,
            retriever,
            generator,
            defaults,
        })
    }

    /// Answers `question` from the retrieved context.
    ///
    /// Request options are validated before any model runs.
    pub fn generate(
        &self,
        question: &str,
        options: GenerateOptions,
    ) -> Result<GenerationOutcome, PipelineError> {
        let params = self
            .defaults
            .resolve(options.top_k, options.max_context_chars)?;

        let normalized_question = normalize(question);
        let passages = self
            .retriever
            .retrieve(&self.embedder, &normalized_question, params.top_k)?;

        let context = assemble_from_retrieved(&passages, params.max_context_chars);
        let prompt = Prompt::new(context.clone(), question);

        debug!(
            top_k = params.top_k,
            max_context_chars = params.max_context_chars,
            retrieved = passages.len(),
            context_chars = context.chars().count(),
            "Context assembled"
        );

        let answer = self.generator.generate(&prompt)?;

        Ok(GenerationOutcome {
            answer,
            normalized_question,
            passages,
            context,
            prompt,
        })
    }

    /// Cosine similarity of the two answers, rounded to four decimals.
    pub fn compare(&self, rag_answer: &str, user_answer: &str) -> Result<f64, PipelineError> {
        Ok(compare_answers(&self.embedder, rag_answer, user_answer)?)
    }

    pub fn embedder(&self) -> &SentenceEmbedder {
        &self.embedder
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn defaults(&self) -> &RetrievalDefaults {
        &self.defaults
    }
}

/// Embeds every corpus passage into a new flat index, position for position.
pub fn build_index(
    embedder: &SentenceEmbedder,
    corpus: &Corpus,
    metric: Metric,
) -> Result<FlatIndex, PipelineError> {
    let vectors = corpus
        .iter()
        .map(|passage| embedder.embed(passage))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        passages = vectors.len(),
        dim = embedder.embedding_dim(),
        ?metric,
        "Embedded corpus"
    );

    Ok(FlatIndex::from_vectors(
        metric,
        embedder.embedding_dim(),
        vectors,
    )?)
}
