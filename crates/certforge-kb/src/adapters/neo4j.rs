//! Neo4j-backed document store adapter
//!
//! Documents live as one node per (collection, key), with the raw document
//! JSON in a `payload` property and the embedding in a `vector` property
//! served by a per-collection vector index.

#[cfg(feature = "neo4rs")]
use std::time::Duration;

#[cfg(feature = "neo4rs")]
use async_trait::async_trait;
#[cfg(feature = "neo4rs")]
use neo4rs::{ConfigBuilder, Graph, Query};
#[cfg(feature = "neo4rs")]
use serde_json::Value;
#[cfg(feature = "neo4rs")]
use tracing::{debug, error, info, instrument};

#[cfg(feature = "neo4rs")]
use crate::data::StoreError;
#[cfg(feature = "neo4rs")]
use crate::traits::{DistanceMetric, DocumentStore, ScoredDocument};

/// Configuration for Neo4j connection
#[cfg(feature = "neo4rs")]
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: usize,
    pub connection_retry_count: u32,
    pub connection_retry_delay: Duration,
}

#[cfg(feature = "neo4rs")]
impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            pool_size: 10,
            connection_retry_count: 3,
            connection_retry_delay: Duration::from_secs(2),
        }
    }
}

#[cfg(feature = "neo4rs")]
impl Neo4jConfig {
    /// Reads connection settings from NEO4J_URI, NEO4J_USERNAME,
    /// NEO4J_PASSWORD and NEO4J_DATABASE, falling back to the defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(uri) = std::env::var("NEO4J_URI") {
            config.uri = uri;
        }
        if let Ok(username) = std::env::var("NEO4J_USERNAME") {
            config.username = username;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            config.password = password;
        }
        config.database = std::env::var("NEO4J_DATABASE").ok();
        config
    }
}

/// Neo4j implementation of the `DocumentStore` trait
#[cfg(feature = "neo4rs")]
pub struct Neo4jDocumentStore {
    graph: Graph,
    config: Neo4jConfig,
}

#[cfg(feature = "neo4rs")]
impl Neo4jDocumentStore {
    /// Returns the configuration used for this store
    pub fn get_config(&self) -> &Neo4jConfig {
        &self.config
    }

    /// Create a new Neo4jDocumentStore instance with retries
    pub async fn new(config: Neo4jConfig) -> Result<Self, StoreError> {
        let mut config_builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.username)
            .password(&config.password)
            .max_connections(config.pool_size);

        if let Some(db) = &config.database {
            config_builder = config_builder.db(db.as_str());
        }

        let neo4j_config = config_builder
            .build()
            .map_err(|e| StoreError::Connection(format!("Failed to build Neo4j config: {}", e)))?;

        let mut last_error = None;
        for attempt in 1..=config.connection_retry_count {
            match Graph::connect(neo4j_config.clone()).await {
                Ok(graph) => {
                    // Test the connection with a simple query
                    let test_query = Query::new("RETURN 1 as test".to_string());
                    match graph.execute(test_query).await {
                        Ok(_) => {
                            info!("Connected to Neo4j at {} (attempt {})", config.uri, attempt);
                            return Ok(Self { graph, config });
                        }
                        Err(e) => {
                            error!("Connection test failed (attempt {}): {}", attempt, e);
                            last_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to connect to Neo4j (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
            }
            if attempt < config.connection_retry_count {
                tokio::time::sleep(config.connection_retry_delay).await;
            }
        }

        Err(StoreError::Connection(format!(
            "Failed to connect to Neo4j after {} attempts. Last error: {:?}",
            config.connection_retry_count, last_error
        )))
    }

    /// Creates the vector index backing similarity queries against
    /// `collection`, a no-op when an equivalent index already exists.
    /// The index's similarity function must match the metric used at
    /// query time.
    #[instrument(skip(self))]
    pub async fn ensure_vector_index(
        &self,
        collection: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<(), StoreError> {
        let label = collection_label(collection)?;
        let similarity = match metric {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
        };

        // Index names and labels cannot be bound as parameters.
        let create_index_query = format!(
            "CALL db.index.vector.createNodeIndex('{}', '{}', 'vector', {}, '{}')",
            index_name(collection),
            label,
            dimensions,
            similarity,
        );

        match self.graph.execute(Query::new(create_index_query)).await {
            Ok(_) => {
                info!(collection = %collection, dimensions, "Created vector index");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if message.contains("already exists") || message.contains("EquivalentSchemaRule") {
                    debug!(collection = %collection, "Vector index already exists");
                    Ok(())
                } else {
                    Err(StoreError::Query(format!(
                        "Failed to create vector index for '{}': {}",
                        collection, message
                    )))
                }
            }
        }
    }
}

/// Collection names become node labels, so they are restricted to
/// identifier characters.
#[cfg(feature = "neo4rs")]
fn collection_label(collection: &str) -> Result<String, StoreError> {
    if collection.is_empty()
        || !collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(StoreError::Query(format!(
            "Invalid collection name '{}': expected ASCII alphanumerics or underscores",
            collection
        )));
    }
    Ok(collection.to_string())
}

#[cfg(feature = "neo4rs")]
fn index_name(collection: &str) -> String {
    format!("{}_vector_index", collection)
}

/// The index reports similarity scores; callers work in distances.
/// Neo4j normalizes cosine similarity to (1 + cos) / 2 and euclidean to
/// 1 / (1 + d^2), so both conversions invert those formulas.
#[cfg(feature = "neo4rs")]
fn score_to_distance(metric: DistanceMetric, score: f64) -> f32 {
    match metric {
        DistanceMetric::Cosine => (2.0 * (1.0 - score)) as f32,
        DistanceMetric::Euclidean => {
            if score <= 0.0 {
                f32::MAX
            } else {
                ((1.0 / score) - 1.0).max(0.0).sqrt() as f32
            }
        }
    }
}

#[cfg(feature = "neo4rs")]
fn extract_vector(document: &Value) -> Result<Vec<f64>, StoreError> {
    let values = document
        .get("vector")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Mapping("document is missing a 'vector' array".to_string()))?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| StoreError::Mapping("vector contains a non-numeric entry".to_string()))
        })
        .collect()
}

#[cfg(feature = "neo4rs")]
#[async_trait]
impl DocumentStore for Neo4jDocumentStore {
    #[instrument(skip(self, document), fields(collection = %collection, key = %key))]
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> Result<(), StoreError> {
        let label = collection_label(collection)?;
        let vector = extract_vector(&document)?;
        let payload = document.to_string();

        let cypher = format!(
            "MERGE (d:{} {{key: $key}})\nSET d.payload = $payload, d.vector = $vector",
            label
        );
        let q = Query::new(cypher)
            .param("key", key)
            .param("payload", payload.as_str())
            .param("vector", vector);

        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Query(format!("Failed to upsert document: {}", e)))?;
        stream
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to upsert document: {}", e)))?;

        debug!(collection = %collection, key = %key, "Upserted document");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection, key = %key))]
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let label = collection_label(collection)?;

        let cypher = format!(
            "MATCH (d:{} {{key: $key}})\nRETURN d.payload as payload",
            label
        );
        let q = Query::new(cypher).param("key", key);

        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Query(format!("Failed to fetch document: {}", e)))?;

        let row = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to fetch document: {}", e)))?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload").map_err(|e| {
                    StoreError::Mapping(format!("row is missing a payload column: {}", e))
                })?;
                let value = serde_json::from_str(&payload).map_err(|e| {
                    StoreError::Mapping(format!("stored payload is not valid JSON: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, vector), fields(collection = %collection, top_k))]
    async fn query_by_vector(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        collection_label(collection)?;
        let embedding: Vec<f64> = vector.iter().map(|v| *v as f64).collect();

        let cypher = "CALL db.index.vector.queryNodes($index_name, $k, $embedding)\n\
                      YIELD node, score\n\
                      RETURN node.payload as payload, score"
            .to_string();
        let q = Query::new(cypher)
            .param("index_name", index_name(collection).as_str())
            .param("k", top_k as i64)
            .param("embedding", embedding);

        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Query(format!("Vector query failed: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Vector query failed: {}", e)))?
        {
            let payload: String = row.get("payload").map_err(|e| {
                StoreError::Mapping(format!("row is missing a payload column: {}", e))
            })?;
            let score: f64 = row.get("score").map_err(|e| {
                StoreError::Mapping(format!("row is missing a score column: {}", e))
            })?;
            let document = serde_json::from_str(&payload).map_err(|e| {
                StoreError::Mapping(format!("stored payload is not valid JSON: {}", e))
            })?;

            results.push(ScoredDocument {
                document,
                distance: score_to_distance(metric, score),
            });
        }

        debug!(collection = %collection, retrieved = results.len(), "Vector query completed");
        Ok(results)
    }
}
