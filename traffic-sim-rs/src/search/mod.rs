//! Vector search capability consulted by the assistant
//!
//! - `VectorSearch`: the one operation the simulator wraps with fault injection
//! - `SearchOptions`: the options accepted by `similarity_search`
//! - `HashingEmbedder`: deterministic local embeddings for queries and facts
//! - `InMemoryVectorStore` / `QdrantStore`: the two backends

mod memory;
mod qdrant;

pub use memory::InMemoryVectorStore;
pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::text::content_terms;

/// Navigation facts loaded into a fresh vector store
pub const NAVIGATION_FACTS: [&str; 5] = [
    "Jump to RaviHyral calculated: coordinates 47.3 by 112.8 in sector 7G, jump drive must reach full charge before engaging.",
    "Jump drive status: capacitors at 87 percent charge, spin-up sequence takes four minutes.",
    "Navigation check complete: star trackers aligned and position fix confirmed at current coordinates against three beacons.",
    "Course correction: a short 0.3 degree burn is scheduled to offset gravitational drift near the nebula.",
    "Estimated arrival: three jumps remaining, roughly fourteen hours of ship time.",
];

const MAX_SEARCH_LIMIT: usize = 100;

/// Options accepted by `similarity_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of documents to return
    pub limit: usize,

    /// Minimum similarity score a document must reach
    pub score_threshold: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 4,
            score_threshold: None,
        }
    }
}

impl SearchOptions {
    /// Set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the score threshold
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Validate limit (1-100) and threshold (0.0-1.0)
    pub fn validate(&self) -> Result<()> {
        if self.limit < 1 || self.limit > MAX_SEARCH_LIMIT {
            return Err(SimError::validation(format!(
                "Invalid limit value: {}, must be between 1 and {}",
                self.limit, MAX_SEARCH_LIMIT
            )));
        }

        if let Some(threshold) = self.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(SimError::validation(format!(
                    "Invalid threshold value: {}, must be between 0.0 and 1.0",
                    threshold
                )));
            }
        }

        Ok(())
    }
}

/// A document returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub score: f32,
    pub text: String,
}

/// Similarity search over navigation knowledge
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Documents most similar to `query`, best first
    async fn similarity_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>>;
}

/// Feature-hashing embedder over stopword-filtered terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// L2-normalized embedding; all zeros when the text has no content terms
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for term in content_terms(text) {
            let hash = fnv1a(term.as_bytes());
            let index = (hash % self.dimension as u64) as usize;
            vector[index] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }

        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Cosine similarity, 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
