//! Semantic answer comparison.
//!
//! Both answers are embedded independently with the shared
//! [`SentenceEmbedder`] and scored by cosine similarity, rounded to
//! [`SIMILARITY_DECIMALS`] places.

pub mod error;


pub use error::ScoringError;

use tracing::debug;

use crate::constants::SIMILARITY_DECIMALS;
use crate::embedding::SentenceEmbedder;

/// Cosine similarity computed in f64 and clamped to `[-1, 1]`.
///
/// A zero-magnitude vector scores `0.0` against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Rounds half away from zero.
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Embeds both answers and returns their rounded cosine similarity.
pub fn compare_answers(
    embedder: &SentenceEmbedder,
    rag_answer: &str,
    user_answer: &str,
) -> Result<f64, ScoringError> {
    let left = embedder.embed(rag_answer)?;
    let right = embedder.embed(user_answer)?;

    let raw = cosine_similarity(&left, &right)?;
    let score = round_to_decimals(raw, SIMILARITY_DECIMALS);

    debug!(
        rag_answer_len = rag_answer.len(),
        user_answer_len = user_answer.len(),
        score,
        "Compared answers"
    );

    Ok(score)
}
