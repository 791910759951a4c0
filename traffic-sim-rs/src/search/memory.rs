// traffic-sim-rs/src/search/memory.rs
// In-process vector store ranked by cosine similarity

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{cosine_similarity, HashingEmbedder, ScoredDocument, SearchOptions, VectorSearch, NAVIGATION_FACTS};
use crate::error::{Result, SimError};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    text: String,
    embedding: Vec<f32>,
}

/// Vector store kept entirely in memory
#[derive(Debug)]
pub struct InMemoryVectorStore {
    embedder: HashingEmbedder,
    entries: RwLock<Vec<StoredDocument>>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: HashingEmbedder) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Store preloaded with the navigation facts
    pub fn seeded(embedder: HashingEmbedder) -> Self {
        let entries: Vec<StoredDocument> = NAVIGATION_FACTS
            .iter()
            .map(|fact| StoredDocument {
                id: Uuid::new_v4().to_string(),
                text: fact.to_string(),
                embedding: embedder.embed(fact),
            })
            .collect();

        log::info!(
            "Seeded in-memory vector store with {} navigation facts",
            entries.len()
        );

        Self {
            embedder,
            entries: RwLock::new(entries),
        }
    }

    /// Embed and store a document, returning its id
    pub async fn add_document(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(SimError::validation("document text must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let embedding = self.embedder.embed(text);

        self.entries.write().await.push(StoredDocument {
            id: id.clone(),
            text: text.to_string(),
            embedding,
        });

        Ok(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorSearch for InMemoryVectorStore {
    async fn similarity_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        options.validate()?;

        let query_embedding = self.embedder.embed(query);
        let threshold = options.score_threshold.unwrap_or(0.0);
        let entries = self.entries.read().await;

        // Zero-score documents share no terms with the query
        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .map(|entry| ScoredDocument {
                id: entry.id.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
                text: entry.text.clone(),
            })
            .filter(|doc| doc.score > 0.0 && doc.score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(options.limit);

        log::debug!(
            "In-memory search returned {} of {} documents",
            scored.len(),
            entries.len()
        );

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> HashingEmbedder {
        HashingEmbedder::new(256)
    }

    #[tokio::test]
    async fn test_seeded_store_contains_facts() {
        let store = InMemoryVectorStore::seeded(embedder());
        assert_eq!(store.len().await, NAVIGATION_FACTS.len());
        assert!(!store.is_empty().await);

        let entries = store.entries.read().await;
        for (entry, fact) in entries.iter().zip(NAVIGATION_FACTS) {
            assert_eq!(entry.text, fact);
            assert_eq!(entry.embedding, embedder().embed(fact));
            assert!(Uuid::parse_str(&entry.id).is_ok());
        }
    }

    #[tokio::test]
    async fn test_best_match_ranks_first() {
        let store = InMemoryVectorStore::seeded(embedder());

        let results = store
            .similarity_search("Can you calculate the jump to RaviHyral?", &SearchOptions::default())
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert!(results[0].text.contains("RaviHyral"));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_limit_and_threshold() {
        let store = InMemoryVectorStore::seeded(embedder());

        let results = store
            .similarity_search("jump drive", &SearchOptions::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        let results = store
            .similarity_search("jump drive", &SearchOptions::default().with_score_threshold(1.0))
            .await
            .unwrap();
        assert!(results.iter().all(|doc| doc.score >= 1.0));
    }

    #[tokio::test]
    async fn test_unrelated_query_returns_nothing() {
        let store = InMemoryVectorStore::seeded(embedder());
        let results = store
            .similarity_search("is it there?", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let store = InMemoryVectorStore::new(embedder());
        let result = store
            .similarity_search("jump", &SearchOptions::default().with_limit(0))
            .await;
        assert!(matches!(result, Err(SimError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let store = InMemoryVectorStore::new(embedder());
        assert!(store.add_document("   ").await.is_err());
        assert!(store.is_empty().await);
    }
}
