//! Vector index access
//!
//! Unstructured retrieval runs a similarity search over passage
//! embeddings. The production implementation queries Neo4j's native
//! vector index, embedding the query text first.

use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::graph::GraphStore;
use crate::VECTOR_INDEX;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// A retrieved passage with its similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Raw passage text
    pub text: String,

    /// Originating document, if known
    pub source: Option<String>,

    /// Similarity score
    pub score: f32,
}

/// Trait for similarity search over passage embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the k most similar passages to the given text
    async fn similarity_search(&self, text: &str, k: usize) -> Result<Vec<Passage>>;
}

/// Vector index backed by Neo4j's `db.index.vector.queryNodes`
pub struct Neo4jVectorIndex {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
}

impl Neo4jVectorIndex {
    /// Create a new vector index over an existing graph store
    pub fn new(store: Arc<dyn GraphStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }
}

#[async_trait]
impl VectorIndex for Neo4jVectorIndex {
    async fn similarity_search(&self, text: &str, k: usize) -> Result<Vec<Passage>> {
        let embedding = self.embedder.embed(text).await?;

        let statement = format!(
            "CALL db.index.vector.queryNodes('{}', $k, $embedding) \
             YIELD node, score \
             RETURN node.text AS text, node.source AS source, score",
            VECTOR_INDEX
        );

        let rows = self
            .store
            .query(&statement, json!({"k": k, "embedding": embedding}))
            .await?;

        let passages = rows
            .into_iter()
            .filter_map(|row| {
                let text = row.get("text")?.as_str()?.to_string();
                let source = row
                    .get("source")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let score = row
                    .get("score")
                    .and_then(|v| v.as_f64())
                    .unwrap_or_default() as f32;
                Some(Passage { text, source, score })
            })
            .collect();

        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use serde_json::{Map, Value};

    struct StaticStore {
        rows: Vec<Map<String, Value>>,
    }

    #[async_trait]
    impl GraphStore for StaticStore {
        async fn query(&self, _statement: &str, _parameters: Value) -> Result<Vec<Map<String, Value>>> {
            Ok(self.rows.clone())
        }
    }

    struct StaticEmbedder;

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn model_name(&self) -> &str {
            "static"
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AppError::EmbeddingError {
                message: "down".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    fn row(text: &str, score: f64) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("text".to_string(), Value::String(text.to_string()));
        map.insert("source".to_string(), Value::Null);
        map.insert("score".to_string(), serde_json::json!(score));
        map
    }

    #[tokio::test]
    async fn test_similarity_search_maps_rows() {
        let index = Neo4jVectorIndex::new(
            Arc::new(StaticStore {
                rows: vec![row("first passage", 0.9), row("second passage", 0.8)],
            }),
            Arc::new(StaticEmbedder),
        );

        let passages = index.similarity_search("question", 2).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "first passage");
        assert!(passages[0].score > passages[1].score);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let index = Neo4jVectorIndex::new(
            Arc::new(StaticStore { rows: vec![] }),
            Arc::new(FailingEmbedder),
        );

        let result = index.similarity_search("question", 2).await;
        assert!(result.is_err());
    }
}
