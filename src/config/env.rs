use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_var};
use super::{
    DEFAULT_CHAT_MODEL, DEFAULT_CHAT_TIMEOUT_SECONDS, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_MEL_FILTERS_REPO, DEFAULT_OPENAI_BASE_URL, DEFAULT_PORT, DEFAULT_WHISPER_MODEL,
    ServerConfig, TlsConfig,
};

/// Build a configuration from environment variables and defaults.
///
/// No validation happens here; callers validate after YAML overrides are applied.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let host = env_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = env_parse::<u16>("PORT", DEFAULT_PORT)?;

    let tls = if env_bool("TLS_ENABLED", true)? {
        let defaults = TlsConfig::default();
        Some(TlsConfig {
            cert_path: env_var("TLS_CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cert_path),
            key_path: env_var("TLS_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_path),
            self_signed: env_bool("TLS_SELF_SIGNED", defaults.self_signed)?,
            allow_http_fallback: env_bool(
                "TLS_ALLOW_HTTP_FALLBACK",
                defaults.allow_http_fallback,
            )?,
        })
    } else {
        None
    };

    Ok(ServerConfig {
        host,
        port,
        tls,
        openai_api_key: env_var("OPENAI_API_KEY"),
        openai_base_url: env_var("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        chat_model: env_var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        chat_timeout_seconds: env_parse("CHAT_TIMEOUT_SECONDS", DEFAULT_CHAT_TIMEOUT_SECONDS)?,
        whisper_model: env_var("WHISPER_MODEL")
            .unwrap_or_else(|| DEFAULT_WHISPER_MODEL.to_string()),
        whisper_language: env_var("WHISPER_LANGUAGE"),
        whisper_mel_filters_repo: env_var("WHISPER_MEL_FILTERS_REPO")
            .unwrap_or_else(|| DEFAULT_MEL_FILTERS_REPO.to_string()),
        scratch_dir: env_var("SCRATCH_DIR").map(PathBuf::from),
        max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        cors_allowed_origins: Some(
            env_var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string()),
        ),
    })
}
