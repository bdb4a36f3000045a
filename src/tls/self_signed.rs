use std::net::{IpAddr, Ipv4Addr};

use rand::RngCore;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, Ia5String, KeyPair, PKCS_RSA_SHA256, SanType,
    SerialNumber,
};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use time::{Duration, OffsetDateTime};
use zeroize::Zeroizing;

use super::TlsError;

const RSA_KEY_BITS: usize = 2048;
const VALIDITY_DAYS: i64 = 365;

/// PEM-encoded certificate and unencrypted PKCS#8 private key.
pub struct GeneratedCertificate {
    pub cert_pem: String,
    pub key_pem: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedCertificate")
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// Generate a 2048-bit RSA key and a self-signed SHA-256 certificate for it.
///
/// Subject and issuer are a fixed development identity. The certificate is
/// valid for a year from now and covers `localhost`, `127.0.0.1` and
/// `local_ip`.
pub fn generate_self_signed(local_ip: IpAddr) -> Result<GeneratedCertificate, TlsError> {
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
        .map_err(|e| TlsError::Generation(format!("RSA key generation: {e}")))?;
    let key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TlsError::Generation(format!("PKCS#8 encoding: {e}")))?;

    let key_pair = KeyPair::from_pem_and_sign_algo(&key_pem, &PKCS_RSA_SHA256)
        .map_err(|e| TlsError::Generation(format!("signing key: {e}")))?;

    let cert = certificate_params(local_ip)?
        .self_signed(&key_pair)
        .map_err(|e| TlsError::Generation(format!("signing: {e}")))?;

    Ok(GeneratedCertificate {
        cert_pem: cert.pem(),
        key_pem,
    })
}

fn certificate_params(local_ip: IpAddr) -> Result<CertificateParams, TlsError> {
    let mut params = CertificateParams::default();

    let mut name = DistinguishedName::new();
    name.push(DnType::CountryName, "US");
    name.push(DnType::StateOrProvinceName, "State");
    name.push(DnType::LocalityName, "City");
    name.push(DnType::OrganizationName, "Local Development");
    name.push(DnType::CommonName, "localhost");
    params.distinguished_name = name;

    params.subject_alt_names = subject_alt_names(local_ip)?;

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(VALIDITY_DAYS);
    params.serial_number = Some(random_serial());

    Ok(params)
}

fn subject_alt_names(local_ip: IpAddr) -> Result<Vec<SanType>, TlsError> {
    let dns = |name: &str| {
        Ia5String::try_from(name.to_string())
            .map(SanType::DnsName)
            .map_err(|e| TlsError::Generation(format!("SAN {name}: {e}")))
    };

    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let mut names = vec![
        dns("localhost")?,
        dns("127.0.0.1")?,
        SanType::IpAddress(loopback),
    ];
    if local_ip != loopback {
        names.push(SanType::IpAddress(local_ip));
    }
    Ok(names)
}

/// Random positive 128-bit serial.
fn random_serial() -> SerialNumber {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    // Clear the sign bit and keep the leading byte non-zero
    bytes[0] = (bytes[0] & 0x7f) | 0x40;
    SerialNumber::from_slice(&bytes)
}
