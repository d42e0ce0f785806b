use crate::core_ftpcommand::reply::FtpReply;
use crate::core_tls::TlsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("Required parameter is null or blank: {0}")]
    InvalidArgument(&'static str),

    #[error("Command failed: {0}")]
    Command(FtpReply),

    #[error("Malformed reply line: {0:?}")]
    MalformedReply(String),

    #[error("Stale data on the control connection: {0:?}")]
    StaleData(String),

    #[error("Control connection closed by the server")]
    ConnectionClosed,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timed out while {0}")]
    Timeout(&'static str),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FtpError {
    /// The failed reply, for protocol errors.
    pub fn reply(&self) -> Option<&FtpReply> {
        match self {
            FtpError::Command(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn to_ftp_response(&self) -> String {
        match self {
            FtpError::Command(reply) => reply.to_string(),
            FtpError::ConnectionClosed => "421 Service not available, closing control connection.".to_string(),
            FtpError::Cancelled => "426 Connection closed; transfer aborted.".to_string(),
            FtpError::Timeout(_) => "421 Timed out.".to_string(),
            _ => "451 Requested action aborted. Local error in processing.".to_string(),
        }
    }
}
