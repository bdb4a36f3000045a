use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Merge environment configuration (base) with optional YAML overrides.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            let enabled = tls.enabled.unwrap_or(true);
            config.tls = if enabled {
                let mut merged = config.tls.take().unwrap_or_else(TlsConfig::default);
                if let Some(cert_path) = tls.cert_path {
                    merged.cert_path = PathBuf::from(cert_path);
                }
                if let Some(key_path) = tls.key_path {
                    merged.key_path = PathBuf::from(key_path);
                }
                if let Some(self_signed) = tls.self_signed {
                    merged.self_signed = self_signed;
                }
                if let Some(fallback) = tls.allow_http_fallback {
                    merged.allow_http_fallback = fallback;
                }
                Some(merged)
            } else {
                None
            };
        }
    }

    if let Some(chat) = yaml.chat {
        if let Some(api_key) = chat.api_key {
            config.openai_api_key = Some(api_key);
        }
        if let Some(base_url) = chat.base_url {
            config.openai_base_url = base_url;
        }
        if let Some(model) = chat.model {
            config.chat_model = model;
        }
        if let Some(timeout) = chat.timeout_seconds {
            config.chat_timeout_seconds = timeout;
        }
    }

    if let Some(transcription) = yaml.transcription {
        if let Some(model) = transcription.model {
            config.whisper_model = model;
        }
        if let Some(language) = transcription.language {
            config.whisper_language = Some(language);
        }
        if let Some(repo) = transcription.mel_filters_repo {
            config.whisper_mel_filters_repo = repo;
        }
        if let Some(dir) = transcription.scratch_dir {
            config.scratch_dir = Some(PathBuf::from(dir));
        }
        if let Some(limit) = transcription.max_upload_bytes {
            config.max_upload_bytes = limit;
        }
    }

    if let Some(security) = yaml.security
        && let Some(origins) = security.cors_allowed_origins
    {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(config)
}
