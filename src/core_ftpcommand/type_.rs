use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_network::control::ControlConnection;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Representation type of the data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FtpDataType {
    /// `TYPE I`, bytes pass through untouched.
    #[default]
    Binary,
    /// `TYPE A`, the server translates line endings.
    Ascii,
}

impl FtpDataType {
    pub fn type_code(&self) -> &'static str {
        match self {
            FtpDataType::Binary => "I",
            FtpDataType::Ascii => "A",
        }
    }
}

impl fmt::Display for FtpDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpDataType::Binary => f.write_str("Binary"),
            FtpDataType::Ascii => f.write_str("ASCII"),
        }
    }
}

/// Sets the representation type for the next transfer.
///
/// The protocol has no way to query the current type, so the command is sent
/// every time, even when the session already uses `data_type`.
pub async fn set_data_type(
    control: &mut ControlConnection,
    data_type: FtpDataType,
    token: &CancellationToken,
) -> Result<(), FtpError> {
    let command = Command::new(FtpCommand::TYPE, data_type.type_code());
    if let Err(e) = control.execute(&command, token).await {
        error!("Failed to set data type {}: {}", data_type, e);
        return Err(e);
    }
    control.session_mut().current_data_type = Some(data_type);
    Ok(())
}
