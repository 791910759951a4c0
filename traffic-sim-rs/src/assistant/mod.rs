//! The navigation assistant ("ART") and its collaborators
//!
//! - `Assistant`: the operation the traffic driver calls for every query
//! - `NavigatorAssistant`: retrieval over a `VectorSearch`, answered by an LLM
//!   when one is configured and by a template otherwise
//! - `Collaborators`: the vector store and LLM client built from `BackendConfig`

mod llm;

pub use llm::{ChatMessage, LlmClient};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::error::{Result, SimError};
use crate::search::{HashingEmbedder, InMemoryVectorStore, QdrantStore, ScoredDocument, SearchOptions, VectorSearch};

const SYSTEM_PROMPT: &str = "You are ART, the navigation computer of a long-range starship. \
Answer the crew's navigation questions briefly, using only the navigation records provided. \
If the records do not cover the question, say so.";

const NO_DATA_ANSWER: &str = "ART: I have no navigation records matching that request.";

/// Answers natural-language navigation queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn get_response(&self, query: &str) -> Result<String>;
}

/// Retrieval-backed navigation assistant
pub struct NavigatorAssistant {
    search: Arc<dyn VectorSearch>,
    llm: Option<LlmClient>,
    options: SearchOptions,
}

impl NavigatorAssistant {
    pub fn new(search: Arc<dyn VectorSearch>, llm: Option<LlmClient>) -> Self {
        Self {
            search,
            llm,
            options: SearchOptions::default(),
        }
    }

    fn context_block(documents: &[ScoredDocument]) -> String {
        if documents.is_empty() {
            return "(no matching navigation records)".to_string();
        }

        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("{}. {}", i + 1, doc.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn template_answer(documents: &[ScoredDocument]) -> String {
        match documents.first() {
            Some(best) => format!("ART: {}", best.text),
            None => NO_DATA_ANSWER.to_string(),
        }
    }
}

impl fmt::Debug for NavigatorAssistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorAssistant")
            .field("llm", &self.llm.as_ref().map(LlmClient::model))
            .field("options", &self.options)
            .finish()
    }
}

#[async_trait]
impl Assistant for NavigatorAssistant {
    async fn get_response(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SimError::validation("query must not be empty"));
        }

        let documents = self.search.similarity_search(query, &self.options).await?;
        log::debug!("Retrieved {} navigation records for '{}'", documents.len(), query);

        match &self.llm {
            Some(llm) => {
                let messages = [
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(format!(
                        "Navigation records:\n{}\n\nQuestion: {}",
                        Self::context_block(&documents),
                        query
                    )),
                ];
                llm.chat(&messages).await
            }
            None => Ok(Self::template_answer(&documents)),
        }
    }
}

/// External services the assistant depends on
pub struct Collaborators {
    /// Backing vector store; `None` when it is disabled or unreachable
    pub vector_store: Option<Arc<dyn VectorSearch>>,

    /// LLM client; `None` without an API key
    pub llm: Option<LlmClient>,
}

impl Collaborators {
    /// Build the collaborators described by `config`
    ///
    /// An unreachable Qdrant leaves `vector_store` empty rather than failing,
    /// so the caller decides whether it can proceed without one.
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        config.validate()?;

        let llm = LlmClient::from_config(config)
            .map_err(|e| SimError::initialization(format!("LLM client: {}", e)))?;
        match &llm {
            Some(client) => log::info!("LLM client configured for model {}", client.model()),
            None => log::warn!("LLM_API_KEY not set; ART will answer from retrieved records only"),
        }

        let embedder = HashingEmbedder::new(config.vector_size);
        let vector_store: Option<Arc<dyn VectorSearch>> = if config.vector_store_disabled {
            log::warn!("Vector store disabled by configuration");
            None
        } else if let Some(url) = &config.qdrant_url {
            log::info!("Connecting to Qdrant at {}", url);
            let store = QdrantStore::new(url, &config.qdrant_collection, embedder, config.http_timeout)
                .map_err(|e| SimError::initialization(format!("Qdrant client: {}", e)))?;

            match store.ensure_collection().await {
                Ok(()) => Some(Arc::new(store) as Arc<dyn VectorSearch>),
                Err(e) => {
                    log::warn!("Qdrant unavailable at {}: {}", url, e);
                    None
                }
            }
        } else {
            Some(Arc::new(InMemoryVectorStore::seeded(embedder)) as Arc<dyn VectorSearch>)
        };

        Ok(Self { vector_store, llm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            id: "1".to_string(),
            score,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_template_answer_quotes_best_record() {
        let docs = vec![doc("coordinates 47.3 by 112.8", 0.9), doc("other", 0.1)];
        assert_eq!(
            NavigatorAssistant::template_answer(&docs),
            "ART: coordinates 47.3 by 112.8"
        );
        assert_eq!(NavigatorAssistant::template_answer(&[]), NO_DATA_ANSWER);
    }

    #[test]
    fn test_context_block() {
        let docs = vec![doc("first", 0.9), doc("second", 0.5)];
        assert_eq!(NavigatorAssistant::context_block(&docs), "1. first\n2. second");
        assert_eq!(
            NavigatorAssistant::context_block(&[]),
            "(no matching navigation records)"
        );
    }

    #[tokio::test]
    async fn test_connect_defaults_to_in_memory_store() {
        let collaborators = Collaborators::connect(&BackendConfig::default()).await.unwrap();
        assert!(collaborators.vector_store.is_some());
        assert!(collaborators.llm.is_none());
    }

    #[tokio::test]
    async fn test_connect_with_disabled_store() {
        let config = BackendConfig {
            vector_store_disabled: true,
            ..BackendConfig::default()
        };
        let collaborators = Collaborators::connect(&config).await.unwrap();
        assert!(collaborators.vector_store.is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = BackendConfig {
            qdrant_url: Some("localhost:6334".to_string()),
            ..BackendConfig::default()
        };
        let result = Collaborators::connect(&config).await;
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unreachable_qdrant_leaves_no_store() {
        let config = BackendConfig {
            qdrant_url: Some("http://127.0.0.1:1".to_string()),
            http_timeout: std::time::Duration::from_secs(1),
            ..BackendConfig::default()
        };
        let collaborators = Collaborators::connect(&config).await.unwrap();
        assert!(collaborators.vector_store.is_none());
    }
}
