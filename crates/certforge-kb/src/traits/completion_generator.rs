//! CompletionGenerator trait definition for chat-style synthesis

use async_trait::async_trait;

use crate::data::errors::CoreError;

/// Represents the interface for invoking a chat-style generative model.
#[async_trait]
pub trait CompletionGenerator: Send + Sync {
    /// Sends the two-message protocol (a system message fixing the output
    /// contract and a user message carrying the composed instruction) and
    /// returns the raw response text.
    ///
    /// Contract: fails with `EmptyResponse` when the model returns blank
    /// text, and with `Provider` on transport failure. No internal retry;
    /// the caller owns the retry policy.
    async fn complete(&self, system_message: &str, user_message: &str)
        -> Result<String, CoreError>;
}
