//! Embedding-based semantic similarity

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{EvalError, EvalResult};

/// Sentence-embedding backend.
///
/// Implementations are constructed once and shared; `embed` must be
/// deterministic for a given model and input and must not mutate shared
/// state visible to other callers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the embedding model (e.g. "all-minilm")
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> EvalResult<Vec<f32>>;
}

/// Cosine similarity of two vectors, clamped to `[-1, 1]`.
///
/// A zero-norm vector (which some backends return for empty input) has no
/// direction; its similarity to anything is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EvalResult<f64> {
    if a.len() != b.len() {
        return Err(EvalError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Scores two texts by the cosine of their embeddings
#[derive(Clone)]
pub struct SemanticScorer {
    embedder: Arc<dyn Embedder>,
}

impl SemanticScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Cosine of the two embeddings.
    ///
    /// Blank text has no direction, so it scores 0 against anything and the
    /// backend is not asked to embed it; some backends return no vector at
    /// all for empty input.
    pub async fn similarity(&self, a: &str, b: &str) -> EvalResult<f64> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Ok(0.0);
        }
        let left = self.embedder.embed(a).await?;
        let right = self.embedder.embed(b).await?;
        cosine_similarity(&left, &right)
    }
}
