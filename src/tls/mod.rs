//! HTTPS bootstrap for local development.
//!
//! On startup the gateway reuses an existing `cert.pem`/`key.pem` pair
//! untouched, or generates a self-signed pair when either file is missing.
//! If generation is impossible the server may fall back to plain HTTP,
//! depending on `allow_http_fallback`.

#[cfg(feature = "self-signed-tls")]
mod self_signed;

#[cfg(feature = "self-signed-tls")]
pub use self_signed::{GeneratedCertificate, generate_self_signed};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ServerConfig, TlsConfig};

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate generation failed: {0}")]
    Generation(String),

    #[error("Certificate generation is unavailable (built without the `self-signed-tls` feature)")]
    GeneratorUnavailable,

    #[error("Certificate files {cert} / {key} are missing and self-signed generation is disabled")]
    Missing { cert: PathBuf, key: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of [`ensure_certificate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Both files were already present and were left unmodified.
    Existing,
    /// A fresh self-signed pair was written.
    Generated,
}

/// How the server should listen.
#[derive(Debug, Clone)]
pub enum ServeMode {
    Https(TlsConfig),
    Http,
}

/// Make sure a certificate/key pair exists at the configured paths.
pub fn ensure_certificate(tls: &TlsConfig) -> Result<CertificateStatus, TlsError> {
    if certificate_pair_exists(&tls.cert_path, &tls.key_path) {
        info!(
            cert = %tls.cert_path.display(),
            key = %tls.key_path.display(),
            "Using existing TLS certificate"
        );
        return Ok(CertificateStatus::Existing);
    }

    if !tls.self_signed {
        return Err(TlsError::Missing {
            cert: tls.cert_path.clone(),
            key: tls.key_path.clone(),
        });
    }

    generate_and_write(tls)?;
    Ok(CertificateStatus::Generated)
}

#[cfg(feature = "self-signed-tls")]
fn generate_and_write(tls: &TlsConfig) -> Result<(), TlsError> {
    info!("Generating self-signed TLS certificate");
    let local_ip = crate::utils::local_ip_address();
    let generated = generate_self_signed(local_ip)?;

    write_private_key(&tls.key_path, generated.key_pem.as_bytes())?;
    std::fs::write(&tls.cert_path, generated.cert_pem.as_bytes()).map_err(|source| {
        TlsError::Write {
            path: tls.cert_path.clone(),
            source,
        }
    })?;

    info!(
        cert = %tls.cert_path.display(),
        key = %tls.key_path.display(),
        "SSL certificate generated for localhost and {local_ip}"
    );
    Ok(())
}

#[cfg(not(feature = "self-signed-tls"))]
fn generate_and_write(_tls: &TlsConfig) -> Result<(), TlsError> {
    Err(TlsError::GeneratorUnavailable)
}

/// Write the unencrypted key, readable by the owner only on Unix.
#[cfg(feature = "self-signed-tls")]
fn write_private_key(path: &Path, pem: &[u8]) -> Result<(), TlsError> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let to_err = |source| TlsError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(to_err)?;
    file.write_all(pem).map_err(to_err)
}

/// Decide between HTTPS and plain HTTP for `config`.
///
/// Certificate bootstrap failures downgrade to HTTP only when the TLS block
/// allows it; otherwise they abort startup.
pub fn resolve_serve_mode(config: &ServerConfig) -> Result<ServeMode, TlsError> {
    let Some(tls) = config.tls.as_ref() else {
        return Ok(ServeMode::Http);
    };

    match ensure_certificate(tls) {
        Ok(_) => Ok(ServeMode::Https(tls.clone())),
        Err(e) if tls.allow_http_fallback => {
            warn!(error = %e, "TLS unavailable, falling back to plain HTTP");
            Ok(ServeMode::Http)
        }
        Err(e) => Err(e),
    }
}

/// True when both files of the pair exist.
fn certificate_pair_exists(cert: &Path, key: &Path) -> bool {
    cert.is_file() && key.is_file()
}
