//! Graph store access
//!
//! The engine consumes the knowledge graph through the narrow
//! [`GraphStore`] trait: a parameterized Cypher statement in, row maps
//! out. The production implementation talks to Neo4j's HTTP transaction
//! endpoint; the engine never writes to the store.

use crate::config::GraphConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// A single result row, keyed by the RETURN column names
pub type Row = Map<String, Value>;

/// Trait for read-only graph queries
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a Cypher statement with parameters and return the rows
    async fn query(&self, statement: &str, parameters: Value) -> Result<Vec<Row>>;
}

/// Neo4j client over the HTTP transaction API
pub struct Neo4jHttpStore {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    /// Create a new store client
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let endpoint = format!(
            "{}/db/{}/tx/commit",
            config.uri.trim_end_matches('/'),
            config.database
        );

        Ok(Self {
            client,
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn query(&self, statement: &str, parameters: Value) -> Result<Vec<Row>> {
        let body = json!({
            "statements": [{
                "statement": statement,
                "parameters": parameters,
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GraphQuery {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::GraphQuery {
                message: format!("HTTP {}: {}", status, text),
            });
        }

        let parsed: TxResponse = response.json().await.map_err(|e| AppError::GraphQuery {
            message: format!("Failed to parse response: {}", e),
        })?;

        if let Some(err) = parsed.errors.first() {
            return Err(AppError::GraphQuery {
                message: format!("{}: {}", err.code, err.message),
            });
        }

        metrics::counter!("graphrag_graph_queries_total").increment(1);

        // Zip each row's values with the column names into a map
        let mut rows = Vec::new();
        for result in parsed.results {
            for data in result.data {
                let mut row = Map::new();
                for (column, value) in result.columns.iter().zip(data.row) {
                    row.insert(column.clone(), value);
                }
                rows.push(row);
            }
        }

        Ok(rows)
    }
}
