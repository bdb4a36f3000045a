//! URL validation for the remote chat API endpoint
//!
//! The base URL receives the API key as a bearer token on every request, so it
//! must be an absolute HTTP(S) URL with a host. Plain HTTP is tolerated (local
//! OpenAI-compatible servers are common in development) but a warning is logged
//! when the host is not a loopback address.

use std::net::IpAddr;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// Returns true when the host names the local machine
pub fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Validates the base URL of an OpenAI-compatible API
///
/// # Example
/// ```rust
/// use voxchat_gateway::utils::validate_api_base_url;
///
/// assert!(validate_api_base_url("https://api.openai.com/v1").is_ok());
/// assert!(validate_api_base_url("http://localhost:11434/v1").is_ok());
/// assert!(validate_api_base_url("ftp://example.com").is_err());
/// ```
pub fn validate_api_base_url(url: &str) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url)?;

    let scheme = parsed.scheme();
    if scheme != "https" && scheme != "http" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_string()));
    }

    if parsed.host().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    if scheme == "http" && !is_loopback_host(&parsed) {
        warn!(
            url = %parsed,
            "Chat API base URL uses plain HTTP; the API key will travel unencrypted"
        );
    }

    Ok(parsed)
}
