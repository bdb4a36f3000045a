use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One conversation turn, forwarded to the remote API unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Conversation role label (`system`, `user`, `assistant`, ...). Not validated.
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Errors from the remote chat-completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Chat request failed: {0}")]
    Network(String),

    /// Non-success status from the provider, already rendered for display.
    #[error("Chat API error: {0}")]
    Api(String),

    #[error("Invalid chat API response: {0}")]
    InvalidResponse(String),
}

/// A hosted chat-completion backend.
///
/// The gateway holds one `Arc<dyn ChatBackend>`; tests substitute a stub.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Send the conversation and return the first choice's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}
