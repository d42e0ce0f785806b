// TLS errors for the control and data connections
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Failed to load CA certificates: {0}")]
    CertificateLoadError(String),

    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshakeError(String),

    #[error("Server refused AUTH TLS: {0}")]
    AuthRefused(String),

    #[error("TLS not configured")]
    TlsNotConfigured,
}

impl TlsError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            TlsError::TlsNotConfigured | TlsError::AuthRefused(_) => {
                "534 TLS not available on this connection.".to_string()
            }
            _ => "451 Requested action aborted. Local error in processing.".to_string(),
        }
    }
}
