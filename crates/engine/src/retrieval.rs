//! Hybrid retrieval
//!
//! Fuses structured graph-neighborhood lookup with vector similarity
//! search into one textual context blob for prompting. The structured
//! path maps extracted entities onto graph nodes through a fuzzy
//! full-text query and collects their one-hop neighborhood; the
//! unstructured path runs a similarity search over passage embeddings.

use crate::extractor::EntityExtractor;
use graphrag_common::errors::Result;
use graphrag_common::graph::GraphStore;
use graphrag_common::vector::VectorIndex;
use graphrag_common::{ENTITY_INDEX, MENTIONS_REL};
use serde_json::json;
use std::sync::Arc;

/// Characters with reserved meaning in Lucene query syntax
const LUCENE_SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
    '\\', '/',
];

/// Build a fuzzy full-text query for the given input
///
/// Strips reserved search-syntax characters, appends an edit-distance-2
/// fuzzy marker to every token and joins with AND. This maps entity
/// surface forms from user questions onto database values while
/// tolerating some misspellings.
pub fn fulltext_query(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if LUCENE_SPECIAL.contains(&c) { ' ' } else { c })
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}~2", word))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Graph-neighborhood retrieval keyed by extracted entities
pub struct StructuredRetriever {
    store: Arc<dyn GraphStore>,
    extractor: Arc<EntityExtractor>,
    neighborhood_limit: usize,
}

impl StructuredRetriever {
    pub fn new(
        store: Arc<dyn GraphStore>,
        extractor: Arc<EntityExtractor>,
        neighborhood_limit: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            neighborhood_limit,
        }
    }

    /// Collect the neighborhood of entities mentioned in the question
    ///
    /// Extraction never fails, a single entity's query failure is
    /// logged and skipped, and an entity with no neighbors is silently
    /// omitted; absence of structured signal is not an error.
    pub async fn retrieve(&self, question: &str) -> String {
        let entities = self.extractor.extract(question).await;
        self.retrieve_for_entities(&entities.names).await
    }

    /// Neighborhood rows for already-extracted entity names
    pub async fn retrieve_for_entities(&self, names: &[String]) -> String {
        let statement = format!(
            "CALL db.index.fulltext.queryNodes('{index}', $query, {{limit:2}}) \
             YIELD node, score \
             CALL {{ \
                 WITH node \
                 MATCH (node)-[r]->(neighbor) WHERE type(r) <> '{mentions}' \
                 RETURN node.id + ' (' + coalesce(node.description, 'N/A') + ') ' + \
                        '-[' + type(r) + ']-> ' + \
                        neighbor.id + ' (' + coalesce(neighbor.description, 'N/A') + ')' AS output \
                 UNION ALL \
                 WITH node \
                 MATCH (node)<-[r]-(neighbor) WHERE type(r) <> '{mentions}' \
                 RETURN neighbor.id + ' (' + coalesce(neighbor.description, 'N/A') + ') ' + \
                        '-[' + type(r) + ']-> ' + \
                        node.id + ' (' + coalesce(node.description, 'N/A') + ')' AS output \
             }} \
             RETURN output LIMIT {limit}",
            index = ENTITY_INDEX,
            mentions = MENTIONS_REL,
            limit = self.neighborhood_limit,
        );

        let mut rows: Vec<String> = Vec::new();

        for name in names {
            let query = fulltext_query(name);
            if query.is_empty() {
                continue;
            }

            match self
                .store
                .query(&statement, json!({"query": query}))
                .await
            {
                Ok(result) => {
                    rows.extend(
                        result
                            .into_iter()
                            .filter_map(|row| row.get("output")?.as_str().map(str::to_string)),
                    );
                }
                Err(e) => {
                    // One entity failing must not abort the whole retrieval
                    tracing::warn!(entity = %name, error = %e, "neighborhood query failed, skipping entity");
                }
            }
        }

        rows.sort();
        rows.truncate(self.neighborhood_limit);
        rows.join("\n")
    }
}

/// Fuses structured and unstructured retrieval into one context blob
pub struct HybridRetriever {
    structured: StructuredRetriever,
    vector: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl HybridRetriever {
    pub fn new(structured: StructuredRetriever, vector: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            structured,
            vector,
            top_k,
        }
    }

    /// The structured path alone, for entity_search steps
    pub fn structured(&self) -> &StructuredRetriever {
        &self.structured
    }

    /// Retrieve a fused context blob for the question
    pub async fn retrieve(&self, question: &str) -> Result<String> {
        tracing::info!(query = %question, "hybrid retrieval");

        let structured_data = self.structured.retrieve(question).await;

        let passages = self.vector.similarity_search(question, self.top_k).await?;
        let unstructured_data = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("#Document ");

        Ok(format!(
            "Structured data:\n{}\nUnstructured data:\n{}\n",
            structured_data, unstructured_data
        ))
    }
}
