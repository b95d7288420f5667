#[cfg(feature = "async-openai")]
use std::time::Duration;

#[cfg(feature = "async-openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client,
};
#[cfg(feature = "async-openai")]
use async_trait::async_trait;
#[cfg(feature = "async-openai")]
use tokio::time::timeout;

#[cfg(feature = "async-openai")]
use crate::data::CoreError;
#[cfg(feature = "async-openai")]
use crate::traits::EmbeddingGenerator;

#[cfg(feature = "async-openai")]
pub struct OpenAIEmbeddingService {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

#[cfg(feature = "async-openai")]
impl OpenAIEmbeddingService {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }

    /// Points the client at a non-default API base. Used by tests that run
    /// against a local stub server.
    pub fn with_base_url(
        api_key: String,
        model: String,
        timeout: Duration,
        api_base: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }
}

#[cfg(feature = "async-openai")]
#[async_trait]
impl EmbeddingGenerator for OpenAIEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| CoreError::provider(e.to_string()))?;

        let response = timeout(self.timeout, self.client.embeddings().create(request))
            .await
            .map_err(|_| {
                CoreError::provider(format!(
                    "embedding request timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| CoreError::provider(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CoreError::provider("embedding response contained no data"))
    }
}
