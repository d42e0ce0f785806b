use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_network::control::ControlConnection;
use log::{debug, info, warn};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// What the caller knows about the size of the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthHint {
    /// Do not try to determine the size.
    Irrelevant,
    /// Ask the server with `SIZE`.
    Unknown,
    /// The size is known; no round trip.
    Known(u64),
}

impl From<i64> for LengthHint {
    /// `-1` (any negative) is irrelevant, `0` unknown, a positive value known.
    fn from(value: i64) -> Self {
        match value {
            v if v < 0 => LengthHint::Irrelevant,
            0 => LengthHint::Unknown,
            v => LengthHint::Known(v as u64),
        }
    }
}

impl fmt::Display for LengthHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthHint::Irrelevant => f.write_str("irrelevant"),
            LengthHint::Unknown => f.write_str("unknown"),
            LengthHint::Known(len) => write!(f, "{}", len),
        }
    }
}

fn parse_size(message: &str) -> Option<u64> {
    message.split_whitespace().next()?.parse().ok()
}

/// Queries the size of `path`.
///
/// Not every server implements `SIZE`, so a failure reply yields `Ok(None)`
/// rather than an error. Connection errors still propagate.
pub async fn get_file_size(
    control: &mut ControlConnection,
    path: &str,
    token: &CancellationToken,
) -> Result<Option<u64>, FtpError> {
    let reply = control
        .send_command(&Command::new(FtpCommand::SIZE, path), token)
        .await?;

    if !reply.is_success() {
        info!("Size of {} not available: {}", path, reply);
        return Ok(None);
    }

    match parse_size(&reply.message) {
        Some(size) => {
            debug!("Size of {} is {}", path, size);
            Ok(Some(size))
        }
        None => {
            warn!("Unparseable SIZE reply for {}: {}", path, reply);
            Ok(None)
        }
    }
}

/// Queries the size of `path`, failing when the server cannot tell.
pub async fn file_size(
    control: &mut ControlConnection,
    path: &str,
    token: &CancellationToken,
) -> Result<u64, FtpError> {
    let reply = control
        .execute(&Command::new(FtpCommand::SIZE, path), token)
        .await?;
    parse_size(&reply.message).ok_or_else(|| FtpError::MalformedReply(reply.to_string()))
}

/// Turns a length hint into a length, querying the server only when the
/// hint is [`LengthHint::Unknown`].
pub async fn resolve_length(
    control: &mut ControlConnection,
    path: &str,
    hint: LengthHint,
    token: &CancellationToken,
) -> Result<Option<u64>, FtpError> {
    match hint {
        LengthHint::Irrelevant => Ok(None),
        LengthHint::Known(length) => Ok(Some(length)),
        LengthHint::Unknown => get_file_size(control, path, token).await,
    }
}
