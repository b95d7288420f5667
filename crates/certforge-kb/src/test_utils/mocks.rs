//! Mock implementations of core interfaces for unit testing
//!
//! Expectation-driven mocks for failure injection and call-count
//! assertions; the deterministic fakes in `fakes` cover the happy paths.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use crate::data::{CoreError, StoreError};
use crate::traits::{
    CompletionGenerator, DistanceMetric, DocumentStore, EmbeddingGenerator, ScoredDocument,
};

mock! {
    pub DocumentStore {}

    #[async_trait]
    impl DocumentStore for DocumentStore {
        async fn upsert(
            &self,
            collection: &str,
            key: &str,
            document: Value,
        ) -> Result<(), StoreError>;

        async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

        async fn query_by_vector(
            &self,
            collection: &str,
            vector: &[f32],
            top_k: usize,
            metric: DistanceMetric,
        ) -> Result<Vec<ScoredDocument>, StoreError>;
    }
}

mock! {
    pub EmbeddingGenerator {}

    #[async_trait]
    impl EmbeddingGenerator for EmbeddingGenerator {
        async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError>;
    }
}

mock! {
    pub CompletionGenerator {}

    #[async_trait]
    impl CompletionGenerator for CompletionGenerator {
        async fn complete(
            &self,
            system_message: &str,
            user_message: &str,
        ) -> Result<String, CoreError>;
    }
}
