// traffic-sim-rs/src/search/qdrant.rs
// Qdrant vector store integration
//
// Talks to Qdrant over gRPC through `qdrant-client`. QDRANT_URL points at the
// gRPC port, e.g. http://localhost:6334.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config, CollectionInfo,
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder, Vectors,
};
use qdrant_client::Qdrant;

use super::{HashingEmbedder, ScoredDocument, SearchOptions, VectorSearch, NAVIGATION_FACTS};
use crate::error::{Result, SimError};

/// Vector store backed by a Qdrant collection
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    embedder: HashingEmbedder,
}

impl QdrantStore {
    /// Build a store for `collection` at `url`; no request is sent yet
    pub fn new(url: &str, collection: &str, embedder: HashingEmbedder, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url).timeout(timeout).build()?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            embedder,
        })
    }

    /// Create the collection and load the navigation facts when it does not exist
    ///
    /// An existing collection must hold unnamed vectors of the embedder's
    /// dimension.
    pub async fn ensure_collection(&self) -> Result<()> {
        log::info!("Ensuring Qdrant collection exists: {}", self.collection);

        if self.client.collection_exists(self.collection.as_str()).await? {
            let info = self.client.collection_info(self.collection.as_str()).await?;
            let size = info.result.as_ref().and_then(configured_vector_size);
            check_vector_size(&self.collection, size, self.embedder.dimension())?;

            log::info!("Qdrant collection {} already exists", self.collection);
            return Ok(());
        }

        log::info!("Creating Qdrant collection: {}", self.collection);
        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.as_str()).vectors_config(VectorParamsBuilder::new(
                    self.embedder.dimension() as u64,
                    Distance::Cosine,
                )),
            )
            .await?;

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(self.collection.as_str(), navigation_points(&self.embedder)).wait(true),
            )
            .await?;

        log::info!(
            "Loaded {} navigation facts into Qdrant collection {}",
            NAVIGATION_FACTS.len(),
            self.collection
        );
        Ok(())
    }
}

impl fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantStore")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder)
            .finish()
    }
}

/// Navigation facts as points with ids 1..=N and a `text` payload
fn navigation_points(embedder: &HashingEmbedder) -> Vec<PointStruct> {
    NAVIGATION_FACTS
        .iter()
        .enumerate()
        .map(|(i, fact)| PointStruct {
            id: Some(PointId::from(i as u64 + 1)),
            vectors: Some(Vectors::from(embedder.embed(fact))),
            payload: HashMap::from([("text".to_string(), Value::from(*fact))]),
            ..Default::default()
        })
        .collect()
}

/// Dimension of the collection's unnamed vectors, if it has them
fn configured_vector_size(info: &CollectionInfo) -> Option<u64> {
    let vectors = info.config.as_ref()?.params.as_ref()?.vectors_config.as_ref()?;

    match vectors.config.as_ref()? {
        Config::Params(params) => Some(params.size),
        Config::ParamsMap(_) => None,
    }
}

fn check_vector_size(collection: &str, configured: Option<u64>, expected: usize) -> Result<()> {
    match configured {
        Some(size) if size == expected as u64 => Ok(()),
        Some(size) => Err(SimError::vector_store_unavailable(format!(
            "collection {} holds {}-dimensional vectors, expected {}",
            collection, size, expected
        ))),
        None => Err(SimError::vector_store_unavailable(format!(
            "collection {} has no single unnamed vector configuration",
            collection
        ))),
    }
}

fn point_id_string(id: Option<PointId>) -> String {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Num(num)) => num.to_string(),
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        None => String::new(),
    }
}

fn document_from_point(point: ScoredPoint) -> ScoredDocument {
    let text = match point.payload.get("text").and_then(|value| value.kind.as_ref()) {
        Some(Kind::StringValue(text)) => text.clone(),
        _ => String::new(),
    };

    ScoredDocument {
        id: point_id_string(point.id),
        score: point.score,
        text,
    }
}

#[async_trait]
impl VectorSearch for QdrantStore {
    async fn similarity_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        options.validate()?;

        let mut request =
            SearchPointsBuilder::new(self.collection.as_str(), self.embedder.embed(query), options.limit as u64)
                .with_payload(true);
        if let Some(threshold) = options.score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self.client.search_points(request).await?;
        let documents: Vec<ScoredDocument> = response.result.into_iter().map(document_from_point).collect();

        log::debug!("Qdrant search returned {} documents", documents.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use qdrant_client::qdrant::{CollectionConfig, CollectionParams, VectorParams, VectorParamsMap, VectorsConfig};

    fn info_with(config: Option<Config>) -> CollectionInfo {
        CollectionInfo {
            config: Some(CollectionConfig {
                params: Some(CollectionParams {
                    vectors_config: Some(VectorsConfig { config }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn text_payload(text: &str) -> HashMap<String, Value> {
        HashMap::from([("text".to_string(), Value::from(text))])
    }

    #[test]
    fn test_navigation_points() {
        let points = navigation_points(&HashingEmbedder::new(16));
        assert_eq!(points.len(), NAVIGATION_FACTS.len());

        for (i, (point, fact)) in points.into_iter().zip(NAVIGATION_FACTS).enumerate() {
            assert_eq!(point_id_string(point.id), (i + 1).to_string());
            match point.payload.get("text").and_then(|value| value.kind.as_ref()) {
                Some(Kind::StringValue(text)) => assert_eq!(text, fact),
                other => panic!("unexpected text payload {:?}", other),
            }
        }
    }

    #[test]
    fn test_scored_point_conversion() {
        let doc = document_from_point(ScoredPoint {
            id: Some(PointId::from(3u64)),
            payload: text_payload("Navigation check complete"),
            score: 0.75,
            ..Default::default()
        });

        assert_eq!(doc.id, "3");
        assert_eq!(doc.score, 0.75);
        assert_eq!(doc.text, "Navigation check complete");
    }

    #[test]
    fn test_scored_point_with_uuid_and_no_text() {
        let doc = document_from_point(ScoredPoint {
            id: Some(PointId::from("5c56c793-69f3-4fbf-87e6-c4bf54c28c26".to_string())),
            payload: HashMap::from([("heading".to_string(), Value::from(12i64))]),
            score: 0.5,
            ..Default::default()
        });

        assert_eq!(doc.id, "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
        assert!(doc.text.is_empty());
    }

    #[test]
    fn test_configured_vector_size() {
        let info = info_with(Some(Config::Params(VectorParams {
            size: 256,
            ..Default::default()
        })));
        assert_eq!(configured_vector_size(&info), Some(256));

        let named = info_with(Some(Config::ParamsMap(VectorParamsMap::default())));
        assert_eq!(configured_vector_size(&named), None);

        assert_eq!(configured_vector_size(&CollectionInfo::default()), None);
    }

    #[test]
    fn test_vector_size_mismatch_is_unavailable() {
        assert!(check_vector_size("art_navigation", Some(256), 256).is_ok());

        let error = check_vector_size("art_navigation", Some(1536), 256).unwrap_err();
        assert!(matches!(error, SimError::VectorStoreUnavailable(_)));
        assert_eq!(
            error.to_string(),
            "Vector store unavailable: collection art_navigation holds 1536-dimensional vectors, expected 256"
        );

        assert!(matches!(
            check_vector_size("art_navigation", None, 256),
            Err(SimError::VectorStoreUnavailable(_))
        ));
    }
}
