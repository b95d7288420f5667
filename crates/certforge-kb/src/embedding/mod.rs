use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::data::CoreError;
use crate::traits::EmbeddingGenerator;

mod openai;

#[cfg(feature = "async-openai")]
pub use openai::OpenAIEmbeddingService;

/// Dimension used by the mock service; matches the default provider model.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Timeout applied around every provider call. An elapsed timeout fails the
/// invocation with a retryable provider error.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Mock embedding service producing deterministic vectors without any
/// external provider. Keyword positions get fixed bumps so related inputs
/// land near each other; the remainder is filled from a text hash to keep
/// distinct inputs apart.
#[derive(Debug, Clone)]
pub struct MockEmbeddingService {
    embedding_dimension: usize,
}

impl MockEmbeddingService {
    pub fn new(embedding_dimension: usize) -> Self {
        Self {
            embedding_dimension,
        }
    }

    fn generate_deterministic_embedding(&self, text: &str) -> Vec<f32> {
        fn set(embedding: &mut [f32], index: usize, value: f32) {
            if let Some(slot) = embedding.get_mut(index) {
                *slot = value;
            }
        }

        let mut embedding = vec![0.0; self.embedding_dimension];
        let lowered = text.to_lowercase();

        // Set some values based on keywords in the text
        if lowered.contains("storage") {
            set(&mut embedding, 0, 0.9);
            set(&mut embedding, 1, 0.8);
        }

        if lowered.contains("compute") {
            set(&mut embedding, 2, 0.85);
            set(&mut embedding, 3, 0.75);
        }

        if lowered.contains("network") {
            set(&mut embedding, 4, 0.9);
            set(&mut embedding, 5, 0.8);
        }

        if lowered.contains("security") || lowered.contains("identity") {
            set(&mut embedding, 8, 0.9);
            set(&mut embedding, 9, 0.8);
        }

        // Make the embedding deterministic based on text hash
        let text_hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
        for i in 20..40.min(self.embedding_dimension) {
            embedding[i] = ((text_hash + i as u64) % 100) as f32 / 100.0;
        }

        // Normalize the embedding
        let magnitude: f32 = embedding.iter().map(|&v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        embedding
    }
}

impl Default for MockEmbeddingService {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingGenerator for MockEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyInput);
        }
        Ok(self.generate_deterministic_embedding(text))
    }
}

/// Configuration for embedding services
#[derive(Debug, Clone)]
pub enum EmbeddingServiceConfig {
    /// Use OpenAI API for embeddings
    OpenAI {
        api_key: String,
        model: String,
        timeout: Duration,
    },
    /// Use mock embeddings for tests and offline runs
    Mock { dimensions: usize },
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            let model = std::env::var("OPENAI_EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string());
            Self::OpenAI {
                api_key,
                model,
                timeout: DEFAULT_PROVIDER_TIMEOUT,
            }
        } else {
            Self::Mock {
                dimensions: DEFAULT_EMBEDDING_DIMENSION,
            }
        }
    }
}

/// Create an embedding generator from the provided configuration
pub fn create_embedding_generator(config: EmbeddingServiceConfig) -> Arc<dyn EmbeddingGenerator> {
    match config {
        #[cfg(feature = "async-openai")]
        EmbeddingServiceConfig::OpenAI {
            api_key,
            model,
            timeout,
        } => Arc::new(OpenAIEmbeddingService::new(api_key, model, timeout)),
        #[cfg(not(feature = "async-openai"))]
        EmbeddingServiceConfig::OpenAI { .. } => {
            panic!("OpenAI embedding service is not available because the 'async-openai' feature is not enabled");
        }
        EmbeddingServiceConfig::Mock { dimensions } => {
            Arc::new(MockEmbeddingService::new(dimensions))
        }
    }
}
