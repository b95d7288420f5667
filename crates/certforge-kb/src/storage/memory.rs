//! In-memory document store with linear-scan vector retrieval

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::data::errors::StoreError;
use crate::traits::document_store::{DistanceMetric, DocumentStore, ScoredDocument};

struct StoredEntry {
    key: String,
    document: Value,
    vector: Vec<f32>,
}

/// Entries live in a Vec so insertion order is preserved; stable sorting at
/// query time then breaks distance ties in that order. `dimension` is fixed
/// by the first vector written to the collection.
#[derive(Default)]
struct MemoryCollection {
    dimension: Option<usize>,
    entries: Vec<StoredEntry>,
}

/// In-memory implementation of `DocumentStore`. The reference store for
/// tests and the demo binary; the query contract matches the external
/// adapters exactly.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.entries.len())
    }

    /// Clear all data in the store
    pub fn clear(&self) {
        self.collections.write().clear();
    }

    fn extract_vector(document: &Value) -> Result<Vec<f32>, StoreError> {
        let array = document
            .get("vector")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                StoreError::Mapping("document is missing a numeric `vector` field".to_string())
            })?;
        array
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    StoreError::Mapping("`vector` field contains a non-numeric entry".to_string())
                })
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Value,
    ) -> Result<(), StoreError> {
        let vector = Self::extract_vector(&document)?;

        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        match entry.dimension {
            None => entry.dimension = Some(vector.len()),
            Some(expected) if expected != vector.len() => {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
        }

        // Replacing in place keeps the entry's insertion position, so
        // tie-break order is stable across re-ingestion.
        if let Some(existing) = entry.entries.iter_mut().find(|e| e.key == key) {
            existing.document = document;
            existing.vector = vector;
        } else {
            entry.entries.push(StoredEntry {
                key: key.to_string(),
                document,
                vector,
            });
        }
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read();
        Ok(collections.get(collection).and_then(|c| {
            c.entries
                .iter()
                .find(|e| e.key == key)
                .map(|e| e.document.clone())
        }))
    }

    async fn query_by_vector(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        if let Some(expected) = entry.dimension {
            if expected != vector.len() {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut scored: Vec<ScoredDocument> = entry
            .entries
            .iter()
            .map(|e| ScoredDocument {
                document: e.document.clone(),
                distance: metric.distance(vector, &e.vector),
            })
            .collect();

        // sort_by is stable, so equal distances keep insertion order.
        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
