//! Feature-hashing embedding provider.
//!
//! Each lowercased alphanumeric token (minus a short stopword list) is hashed
//! with 64-bit FNV-1a into one of `dimensions` buckets; the bucket counts are
//! L2-normalized. Texts sharing vocabulary land close in cosine distance. The
//! output is stable across processes and platforms, so it works for offline
//! setups and tests where the ONNX model is unavailable.

use anyhow::Result;

use super::EmbeddingProvider;
use crate::memory::vector::l2_normalize;

/// Identifier recorded in the database for hash-embedded records.
pub const MODEL_NAME: &str = "fnv1a-hash";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
    "is", "it", "of", "on", "or", "that", "the", "this", "to", "was", "were", "what", "who",
    "with",
];

pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Lowercased alphanumeric tokens with stopwords removed.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut buckets = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let slot = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            buckets[slot] += 1.0;
        }
        Ok(l2_normalize(&buckets))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
