use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::data::CoreError;
use crate::embedding::DEFAULT_PROVIDER_TIMEOUT;
use crate::traits::CompletionGenerator;

mod openai;

#[cfg(feature = "async-openai")]
pub use openai::OpenAICompletionService;

/// Mock completion service producing a fixed, fence-wrapped project idea.
/// The fences are deliberate so offline runs still exercise the sanitizer's
/// repair path.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionService;

impl MockCompletionService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionGenerator for MockCompletionService {
    async fn complete(
        &self,
        _system_message: &str,
        _user_message: &str,
    ) -> Result<String, CoreError> {
        let idea = json!({
            "title": "Static Website with Managed Storage",
            "description": "Deploys a small static website backed by object storage, with public read access and request logging enabled.",
            "steps": [
                "Step 1: Create a storage account",
                "Step 2: Enable static website hosting",
                "Step 3: Upload the site content",
                "Step 4: Configure public read access",
                "Step 5: Enable request logging"
            ]
        });
        Ok(format!("```json\n{}\n```", idea))
    }
}

/// Configuration for completion services
#[derive(Debug, Clone)]
pub enum CompletionServiceConfig {
    /// Use OpenAI API for chat completions
    OpenAI {
        api_key: String,
        model: String,
        timeout: Duration,
    },
    /// Use a canned response for tests and offline runs
    Mock,
}

impl Default for CompletionServiceConfig {
    fn default() -> Self {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            let model =
                std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
            Self::OpenAI {
                api_key,
                model,
                timeout: DEFAULT_PROVIDER_TIMEOUT,
            }
        } else {
            Self::Mock
        }
    }
}

/// Create a completion generator from the provided configuration
pub fn create_completion_generator(
    config: CompletionServiceConfig,
) -> Arc<dyn CompletionGenerator> {
    match config {
        #[cfg(feature = "async-openai")]
        CompletionServiceConfig::OpenAI {
            api_key,
            model,
            timeout,
        } => Arc::new(OpenAICompletionService::new(api_key, model, timeout)),
        #[cfg(not(feature = "async-openai"))]
        CompletionServiceConfig::OpenAI { .. } => {
            panic!("OpenAI completion service is not available because the 'async-openai' feature is not enabled");
        }
        CompletionServiceConfig::Mock => Arc::new(MockCompletionService::new()),
    }
}
