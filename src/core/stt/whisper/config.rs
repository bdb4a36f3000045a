use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MEL_FILTERS_REPO, DEFAULT_WHISPER_MODEL, ServerConfig};

/// Upper bound on generated tokens per 30 second window.
pub const DEFAULT_MAX_DECODE_TOKENS: usize = 224;

/// Settings for the local Whisper engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Hugging Face model id, e.g. `openai/whisper-base`.
    pub model_id: String,
    /// Repository holding precomputed mel filter banks.
    pub mel_filters_repo: String,
    /// ISO 639-1 code forced as the language token; `None` lets the model guess.
    pub language: Option<String>,
    pub max_decode_tokens: usize,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_WHISPER_MODEL.to_string(),
            mel_filters_repo: DEFAULT_MEL_FILTERS_REPO.to_string(),
            language: None,
            max_decode_tokens: DEFAULT_MAX_DECODE_TOKENS,
        }
    }
}

impl WhisperConfig {
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            model_id: config.whisper_model.clone(),
            mel_filters_repo: config.whisper_mel_filters_repo.clone(),
            language: config.whisper_language.clone(),
            ..Self::default()
        }
    }

    /// Special token forcing the transcription language, e.g. `<|en|>`.
    pub fn language_token(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(|lang| format!("<|{}|>", lang.to_ascii_lowercase()))
    }
}
