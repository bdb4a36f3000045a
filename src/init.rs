//! Initialization helpers for preparing runtime assets before starting the
//! gateway.
//!
//! This module powers the `voxchat-gateway init` CLI command. The command
//! downloads the configured Whisper model, tokenizer and mel filters into the
//! Hugging Face cache so that regular server startups do not have to perform
//! network fetches.
//!
//! ```text
//! $ WHISPER_MODEL=openai/whisper-small voxchat-gateway init
//! ```

use anyhow::Result;
#[cfg(feature = "local-whisper")]
use anyhow::anyhow;

use crate::config::ServerConfig;

/// Download and cache every asset the local speech model needs.
#[cfg(feature = "local-whisper")]
pub async fn run(config: &ServerConfig) -> Result<()> {
    use crate::core::stt::whisper::{WhisperAssets, WhisperConfig};

    let whisper = WhisperConfig::from_server_config(config);
    tracing::info!(
        model = %whisper.model_id,
        mel_filters = %whisper.mel_filters_repo,
        "Preparing Whisper assets"
    );

    let assets = tokio::task::spawn_blocking(move || WhisperAssets::fetch(&whisper))
        .await
        .map_err(|e| anyhow!("asset download task failed: {e}"))??;

    tracing::info!(
        weights = %assets.weights.display(),
        "Whisper assets downloaded successfully"
    );
    Ok(())
}

/// Without the `local-whisper` feature there is nothing to download.
#[cfg(not(feature = "local-whisper"))]
pub async fn run(_config: &ServerConfig) -> Result<()> {
    anyhow::bail!("`init` requires the `local-whisper` feature")
}
