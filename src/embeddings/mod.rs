//! Embedding generation
//!
//! The engine only depends on the [`Embedder`] trait; any sentence encoder
//! with a fixed output dimension can sit behind it. The built-in
//! [`HashEmbedder`] is a deterministic word-hash projection that keeps the
//! server fully offline with no model download.

use anyhow::Result;

/// Trait for embedding generation
pub trait Embedder: Send + Sync {
    /// Generate embedding for text
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Batch encode multiple texts (default: sequential)
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

/// Deterministic hash-based embedder
///
/// Distributes per-word hash bits across the output vector and normalizes to
/// unit length. Word-order insensitive and far weaker than a learned model,
/// but stable across runs and adequate for exercising the similarity
/// machinery.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for HashEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut embedding = vec![0.0f32; self.dimension];

        if text.is_empty() {
            return Ok(embedding);
        }

        for word in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();

            for j in 0..self.dimension {
                embedding[j] += ((hash >> (j % 64)) & 1) as f32 * 0.1;
            }
        }

        // Normalize
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
