//! OpenAI-compatible chat-completion client.
//!
//! One request per call, no retries or streaming. The HTTP client is built
//! once and reused so connections are pooled across requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::base::{ChatBackend, ChatMessage, LlmError};
use super::messages::{ChatCompletionRequest, ChatCompletionResponse, OpenAIErrorResponse};
use crate::config::ServerConfig;

/// Connection settings for [`OpenAIChat`].
#[derive(Clone)]
pub struct OpenAIChatConfig {
    /// Absent keys are reported on the first call, not at startup.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAIChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Drop for OpenAIChatConfig {
    fn drop(&mut self) {
        if let Some(key) = self.api_key.as_mut() {
            key.zeroize();
        }
    }
}

impl OpenAIChatConfig {
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.chat_model.clone(),
            timeout: config.chat_timeout(),
        }
    }

    /// Full URL of the completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat backend talking to OpenAI (or any compatible server).
#[derive(Debug)]
pub struct OpenAIChat {
    config: OpenAIChatConfig,
    http_client: Client,
}

impl OpenAIChat {
    pub fn new(config: OpenAIChatConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        if config.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; /chat requests will fail until it is configured");
        }

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAIChat {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
        };

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OpenAIErrorResponse>(&response_text) {
                Ok(envelope) => envelope.error.to_string(),
                Err(_) => format!("{status}: {response_text}"),
            };
            return Err(LlmError::Api(message));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        completion
            .into_first_content()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))
    }
}
