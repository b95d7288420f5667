//! DocumentStore trait definition for vector-document persistence

use async_trait::async_trait;
use serde_json::Value;

use crate::data::errors::StoreError;

/// Distance metric used for nearest-neighbor retrieval. Must match the
/// metric in effect when the collection's embeddings were produced and
/// must not vary within a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two vectors of equal dimension. Smaller is closer
    /// for both metrics; cosine distance is `1 - similarity`, with
    /// zero-magnitude vectors treated as maximally distant.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let mag_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
                let mag_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
                if mag_a == 0.0 || mag_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (mag_a * mag_b)
                }
            }
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// A document returned from a similarity query together with its distance
/// to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Value,
    pub distance: f32,
}

/// Represents the interface for the vector-document store.
/// This abstracts the underlying storage technology; only the query
/// contract is specified, never the index internals.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or replaces the document stored under `key` in `collection`.
    ///
    /// Contract: idempotent upsert keyed by `key`; re-ingestion of the same
    /// key overwrites in place, never duplicates. The document must carry
    /// its embedding under a `vector` field; the first vector written to a
    /// collection fixes that collection's dimensionality.
    async fn upsert(&self, collection: &str, key: &str, document: Value)
        -> Result<(), StoreError>;

    /// Fetches the document stored under `key`, or `None` when absent.
    ///
    /// Contract: absence is an expected state, not an error.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Retrieves up to `top_k` documents ordered by ascending distance to
    /// `vector` under `metric`.
    ///
    /// Contract: ties break by stable insertion order; an empty collection
    /// yields an empty result, not an error. The query vector must match
    /// the collection's dimensionality.
    async fn query_by_vector(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<ScoredDocument>, StoreError>;
}
