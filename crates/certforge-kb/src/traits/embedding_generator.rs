//! EmbeddingGenerator trait definition for vector embeddings

use async_trait::async_trait;

use crate::data::errors::CoreError;

/// Represents the interface for generating vector embeddings from text.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Generates an embedding vector for the given text.
    ///
    /// Contract: fails with `EmptyInput` when `text` is blank, checked
    /// before any provider call; fails with `Provider` on transport or
    /// auth failure, with no internal retry. Safe to call repeatedly with
    /// the same input; the returned dimension is fixed per implementation.
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError>;
}
