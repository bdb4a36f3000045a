use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::{ChatBackend, OpenAIChat, OpenAIChatConfig, Transcriber};

/// Application state shared by every handler.
///
/// Built once at startup; nothing in it changes afterwards.
pub struct AppState {
    pub config: ServerConfig,
    pub transcriber: Transcriber,
    pub chat: Arc<dyn ChatBackend>,
}

impl AppState {
    /// Load the speech model and build the chat client from `config`.
    ///
    /// Loading the model may download it on first run. A missing API key is
    /// not an error here; it surfaces on the first `/chat` call.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let transcriber = Transcriber::from_config(&config)
            .await
            .context("Failed to load speech recognition model")?;
        info!(model = transcriber.model_name(), "Speech model ready");

        let chat = OpenAIChat::new(OpenAIChatConfig::from_server_config(&config))
            .context("Failed to create chat client")?;
        info!(model = chat.model(), "Chat client ready");

        Ok(Self::with_components(config, transcriber, Arc::new(chat)))
    }

    /// Assemble state from pre-built parts.
    pub fn with_components(
        config: ServerConfig,
        transcriber: Transcriber,
        chat: Arc<dyn ChatBackend>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            transcriber,
            chat,
        })
    }
}
