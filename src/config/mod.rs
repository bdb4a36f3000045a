//! Configuration module for the VoxChat gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! The configuration is split into logical submodules for maintainability.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voxchat_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_PORT: u16 = 5000;
/// Default chat-completion API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default chat model forwarded to the remote API
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
/// Default remote chat timeout, matching the upstream SDK default
pub const DEFAULT_CHAT_TIMEOUT_SECONDS: u64 = 600;
/// Default Whisper checkpoint on the Hugging Face hub
pub const DEFAULT_WHISPER_MODEL: &str = "openai/whisper-base";
/// Repository hosting the precomputed mel filter bank
pub const DEFAULT_MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";
/// Default upload limit for `/transcribe` (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// TLS configuration for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
    /// Generate a self-signed pair when either file is missing
    pub self_signed: bool,
    /// Serve plain HTTP (with a warning) when no usable certificate can be produced
    pub allow_http_fallback: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
            self_signed: true,
            allow_http_fallback: true,
        }
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port, TLS)
/// - Remote chat API settings (key, base URL, model)
/// - Local transcription settings (Whisper checkpoint, language, scratch dir)
/// - Security settings (CORS, upload limit)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (None = plain HTTP)
    pub tls: Option<TlsConfig>,

    // Remote chat API
    /// OpenAI API key. Not validated at startup; a missing key fails the first chat call.
    pub openai_api_key: Option<String>,
    /// Base URL of the chat-completion API (e.g., "https://api.openai.com/v1")
    pub openai_base_url: String,
    /// Model identifier sent with every chat request
    pub chat_model: String,
    /// Request timeout for the remote chat call
    pub chat_timeout_seconds: u64,

    // Local transcription
    /// Hugging Face model id of the Whisper checkpoint
    pub whisper_model: String,
    /// Forced language code (e.g., "en"); None lets the model detect it
    pub whisper_language: Option<String>,
    /// Hugging Face repo containing `melfilters.bytes`
    pub whisper_mel_filters_repo: String,
    /// Directory for per-request scratch files; None uses the system temp dir
    pub scratch_dir: Option<PathBuf>,
    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: Some(TlsConfig::default()),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_timeout_seconds: DEFAULT_CHAT_TIMEOUT_SECONDS,
            whisper_model: DEFAULT_WHISPER_MODEL.to_string(),
            whisper_language: None,
            whisper_mel_filters_repo: DEFAULT_MEL_FILTERS_REPO.to_string(),
            scratch_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: Some("*".to_string()),
        }
    }
}

/// Zeroize the API key when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Environment variables (with defaults) form the base configuration and YAML
    /// values override them. The .env file is loaded in `main` before this runs,
    /// so actual environment variables already take precedence over .env values.
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Timeout applied to the remote chat call
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_seconds)
    }

    /// Model name reported by `/health`
    ///
    /// The last path segment of the Hugging Face id, so `openai/whisper-base`
    /// is reported as `whisper-base`.
    pub fn whisper_display_name(&self) -> &str {
        model_display_name(&self.whisper_model)
    }
}

/// Last non-empty path segment of a model id.
pub fn model_display_name(model_id: &str) -> &str {
    model_id
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(model_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("TLS_ENABLED");
            env::remove_var("TLS_CERT_PATH");
            env::remove_var("TLS_KEY_PATH");
            env::remove_var("TLS_SELF_SIGNED");
            env::remove_var("TLS_ALLOW_HTTP_FALLBACK");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_BASE_URL");
            env::remove_var("CHAT_MODEL");
            env::remove_var("CHAT_TIMEOUT_SECONDS");
            env::remove_var("WHISPER_MODEL");
            env::remove_var("WHISPER_LANGUAGE");
            env::remove_var("WHISPER_MEL_FILTERS_REPO");
            env::remove_var("SCRATCH_DIR");
            env::remove_var("MAX_UPLOAD_BYTES");
            env::remove_var("CORS_ALLOWED_ORIGINS");
        }
    }

    #[test]
    fn test_whisper_display_name() {
        let mut config = ServerConfig::default();
        assert_eq!(config.whisper_display_name(), "whisper-base");

        config.whisper_model = "whisper-tiny".to_string();
        assert_eq!(config.whisper_display_name(), "whisper-tiny");

        config.whisper_model = "distil-whisper/distil-small.en/".to_string();
        assert_eq!(config.whisper_display_name(), "distil-small.en");
    }

    #[test]
    fn test_address_format() {
        let mut config = ServerConfig::default();
        config.host = "127.0.0.1".to_string();
        config.port = 8443;
        assert_eq!(config.address(), "127.0.0.1:8443");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.tls, Some(TlsConfig::default()));
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.whisper_model, "openai/whisper-base");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.cors_allowed_origins.as_deref(), Some("*"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("TLS_ENABLED", "false");
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("CHAT_MODEL", "gpt-4o-mini");
            env::set_var("WHISPER_LANGUAGE", "en");
            env::set_var("SCRATCH_DIR", "/tmp/voxchat");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.port, 8080);
        assert!(!config.is_tls_enabled());
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.whisper_language.as_deref(), Some("en"));
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/tmp/voxchat")));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  tls:
    cert_path: "/etc/voxchat/cert.pem"
    key_path: "/etc/voxchat/key.pem"
    allow_http_fallback: false

chat:
  api_key: "yaml-key"
  model: "gpt-4o-mini"

transcription:
  model: "openai/whisper-small"
  max_upload_bytes: 1048576
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        let tls = config.tls.clone().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/etc/voxchat/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/etc/voxchat/key.pem"));
        assert!(tls.self_signed);
        assert!(!tls.allow_http_fallback);
        assert_eq!(config.openai_api_key.as_deref(), Some("yaml-key"));
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.whisper_display_name(), "whisper-small");
        assert_eq!(config.max_upload_bytes, 1_048_576);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"

chat:
  api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "7000");
            env::set_var("OPENAI_API_KEY", "env-key");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.openai_api_key.as_deref(), Some("yaml-key"));
        // ENV value survives where YAML is silent
        assert_eq!(config.port, 7000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_can_disable_tls() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server:\n  tls:\n    enabled: false\n").unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert!(!config.is_tls_enabled());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_bad_base_url() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "chat:\n  base_url: \"ftp://example.com\"\n").unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base URL"));

        cleanup_env_vars();
    }
}
