// TLS client configuration
use crate::core_tls::error::TlsError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain FTP.
    #[default]
    None,
    /// `AUTH TLS` upgrade of the control connection, then `PROT P` data.
    Explicit,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,

    /// PEM bundle of trusted roots. The bundled web PKI roots are used when unset.
    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    /// Skip certificate verification entirely.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl TlsConfig {
    pub fn is_enabled(&self) -> bool {
        self.mode != TlsMode::None
    }

    pub fn validate(&self) -> Result<(), TlsError> {
        if let Some(ca_file) = &self.ca_file {
            if !ca_file.exists() {
                return Err(TlsError::CertificateLoadError(format!(
                    "CA file not found: {:?}",
                    ca_file
                )));
            }
        }
        Ok(())
    }

    pub fn client_config(&self) -> Result<rustls::ClientConfig, TlsError> {
        if self.accept_invalid_certs {
            return Ok(rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
                .with_no_client_auth());
        }

        let mut roots = RootCertStore::empty();
        match &self.ca_file {
            Some(path) => {
                let file = fs::File::open(path)
                    .map_err(|e| TlsError::CertificateLoadError(format!("{:?}: {}", path, e)))?;
                let mut reader = BufReader::new(file);
                for cert in rustls_pemfile::certs(&mut reader) {
                    let cert = cert.map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
                    roots
                        .add(cert)
                        .map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
                }
                if roots.is_empty() {
                    return Err(TlsError::CertificateLoadError(format!(
                        "No certificate found in {:?}",
                        path
                    )));
                }
            }
            None => roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
        }

        Ok(rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth())
    }
}

#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain() {
        let config = TlsConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_ca_file_rejected() {
        let config = TlsConfig {
            mode: TlsMode::Explicit,
            ca_file: Some(PathBuf::from("/nonexistent/ca.pem")),
            accept_invalid_certs: false,
        };
        assert!(matches!(
            config.validate(),
            Err(TlsError::CertificateLoadError(_))
        ));
    }

    #[test]
    fn test_builds_client_config_with_web_roots() {
        let config = TlsConfig {
            mode: TlsMode::Explicit,
            ..TlsConfig::default()
        };
        assert!(config.client_config().is_ok());
    }
}
