#[cfg(feature = "async-openai")]
use std::time::Duration;

#[cfg(feature = "async-openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
#[cfg(feature = "async-openai")]
use async_trait::async_trait;
#[cfg(feature = "async-openai")]
use tokio::time::timeout;

#[cfg(feature = "async-openai")]
use crate::data::CoreError;
#[cfg(feature = "async-openai")]
use crate::traits::CompletionGenerator;

#[cfg(feature = "async-openai")]
pub struct OpenAICompletionService {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

#[cfg(feature = "async-openai")]
impl OpenAICompletionService {
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
impl CompletionGenerator for OpenAICompletionService {
    async fn complete(
        &self,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, CoreError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_message)
                    .build()
                    .map_err(|e| CoreError::provider(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()
                    .map_err(|e| CoreError::provider(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| CoreError::provider(e.to_string()))?;

        let response = timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                CoreError::provider(format!(
                    "completion request timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| CoreError::provider(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(CoreError::EmptyResponse);
        }
        Ok(content)
    }
}
