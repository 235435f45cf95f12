// src/services/embeddings.rs
//! Text embedding providers.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::services::openai::OpenAIService;

pub const DEFAULT_VECTOR_DIMENSION: usize = 768;

/// Reads `VECTOR_DIMENSION`, falling back to 768
pub fn dimension_from_env() -> usize {
    std::env::var("VECTOR_DIMENSION")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_VECTOR_DIMENSION)
}

/// Turns text into a fixed-size vector.
///
/// Implementations never fail: on error they return a zero vector, which
/// the vector store treats as "no embedding".
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Vec<f32>;
}

pub struct OpenAIEmbeddings {
    openai: Arc<OpenAIService>,
    dimension: usize,
}

impl OpenAIEmbeddings {
    pub fn new(openai: Arc<OpenAIService>, dimension: usize) -> Self {
        Self { openai, dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return vec![0.0; self.dimension];
        }

        match self.openai.embed(text, self.dimension).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "Embedding request failed, using zero vector");
                vec![0.0; self.dimension]
            }
        }
    }
}

pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| v.abs() <= 1e-12)
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Deterministic bag-of-words embeddings for tests
#[cfg(test)]
pub struct KeywordEmbeddings {
    pub dimension: usize,
}

#[cfg(test)]
#[async_trait]
impl EmbeddingProvider for KeywordEmbeddings {
    async fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
        {
            let hash = token
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % self.dimension as u64) as usize] += 1.0;
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_zero_vector_detection() {
        assert!(is_zero_vector(&[0.0; 4]));
        assert!(is_zero_vector(&[]));
        assert!(!is_zero_vector(&[0.0, 0.1]));
    }

    #[tokio::test]
    async fn test_keyword_embeddings_are_stable() {
        let provider = KeywordEmbeddings { dimension: 64 };
        let a = provider.embed("Rust backend engineer").await;
        let b = provider.embed("rust BACKEND engineer!").await;
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_openai_embeddings_fall_back_to_zeros() {
        if test_support::openai_env_configured() {
            return;
        }
        let (_pool, openai) = test_support::unconfigured_openai().await;
        let provider = OpenAIEmbeddings::new(openai, 16);

        let vector = provider.embed("some text").await;
        assert_eq!(vector.len(), 16);
        assert!(is_zero_vector(&vector));
    }
}
