use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::reply::FtpReply;
use crate::core_network::control::ControlConnection;
use crate::helpers::{ftp_path, join_ftp_path};
use tokio_util::sync::CancellationToken;

/// Extracts the directory from `257 "<dir>" is the current directory`.
/// Doubled quotes inside the name stand for one quote.
pub fn parse_pwd_reply(reply: &FtpReply) -> Result<String, FtpError> {
    let message = &reply.message;
    let start = message.find('"');
    let end = message.rfind('"');
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            Ok(ftp_path(&message[start + 1..end].replace("\"\"", "\"")))
        }
        _ => message
            .split_whitespace()
            .next()
            .filter(|dir| dir.starts_with('/'))
            .map(ftp_path)
            .ok_or_else(|| FtpError::MalformedReply(reply.to_string())),
    }
}

pub async fn get_working_directory(
    control: &mut ControlConnection,
    token: &CancellationToken,
) -> Result<String, FtpError> {
    let reply = control
        .execute(&Command::bare(FtpCommand::PWD), token)
        .await?;
    parse_pwd_reply(&reply)
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b":/")
}

/// Resolves `path` against the working directory. Absolute paths are returned
/// as they are; anything else costs a `PWD` round trip.
pub async fn get_absolute_path(
    control: &mut ControlConnection,
    path: &str,
    token: &CancellationToken,
) -> Result<String, FtpError> {
    let path = ftp_path(path);
    if path == "./" || path == "." {
        return get_working_directory(control, token).await;
    }
    if is_absolute(&path) {
        return Ok(path);
    }

    let cwd = get_working_directory(control, token).await?;
    Ok(join_ftp_path(&cwd, &path))
}
