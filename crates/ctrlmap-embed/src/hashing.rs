//! # Hashing Embedder — Offline Feature-Hashing Backend
//!
//! Projects text into a fixed dimension by signed feature hashing. Each
//! lowercase word token and each character trigram of the normalized text
//! is hashed with SHA-256; the first four digest bytes pick a bucket, the
//! fifth picks a sign. The accumulated vector is L2-normalized.
//!
//! Texts that share vocabulary land close together under cosine similarity,
//! which is enough for tests, air-gapped runs, and smoke checks. It is not
//! a semantic model.
//!
//! Blank text produces the zero vector, which the similarity engine scores
//! as 0 against everything.

use ctrlmap_core::EmbeddingError;
use sha2::{Digest, Sha256};

use crate::backend::EmbeddingBackend;

/// Weight of a whole-word feature relative to a trigram.
const WORD_WEIGHT: f32 = 2.0;

/// Deterministic local embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Result<Self, EmbeddingError> {
        if dimensions == 0 {
            return Err(EmbeddingError::Config(
                "hashing dimensions must be greater than zero".into(),
            ));
        }
        Ok(Self {
            dimensions,
            model_id: format!("hashing-{dimensions}"),
        })
    }

    /// Output dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let normalized = normalize(text);
        if normalized.is_empty() {
            return vector;
        }

        for word in normalized.split(' ') {
            self.accumulate(&mut vector, b'w', word, WORD_WEIGHT);
        }
        let padded: Vec<char> = format!(" {normalized} ").chars().collect();
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            self.accumulate(&mut vector, b'g', &gram, 1.0);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], kind: u8, feature: &str, weight: f32) {
        let digest = Sha256::new()
            .chain_update([kind])
            .chain_update(feature.as_bytes())
            .finalize();
        let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
            % self.dimensions;
        let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl EmbeddingBackend for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Lowercase, keep alphanumerics, collapse everything else to single spaces.
fn normalize(text: &str) -> String {
    let lowered: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}
