use super::ServerConfig;
use crate::utils::validate_api_base_url;

/// Validate a fully merged configuration.
pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.port == 0 {
        return Err("PORT must be greater than 0".into());
    }

    validate_api_base_url(&config.openai_base_url)
        .map_err(|e| format!("Invalid chat API base URL '{}': {e}", config.openai_base_url))?;

    if config.chat_model.trim().is_empty() {
        return Err("Chat model must not be empty".into());
    }

    if config.whisper_model.trim().is_empty() {
        return Err("Whisper model must not be empty".into());
    }

    if config.max_upload_bytes == 0 {
        return Err("MAX_UPLOAD_BYTES must be greater than 0".into());
    }

    if let Some(tls) = &config.tls
        && (tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty())
    {
        return Err("TLS certificate and key paths must not be empty".into());
    }

    Ok(())
}
