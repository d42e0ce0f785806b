use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::size::resolve_length;
use crate::core_ftpcommand::transfer::{configure_stream, TransferRequest};
use crate::core_ftpcommand::type_::set_data_type;
use crate::core_network::control::ControlConnection;
use crate::core_network::data::DataChannelFactory;
use crate::core_network::stream::TransferStream;
use crate::helpers::{ftp_path, is_blank};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

/// Opens `request.path` for reading with `RETR`.
///
/// Resolves the length when the hint asks for it, sets the representation
/// type, then issues `RETR` (preceded by `REST` when resuming) on a fresh
/// data connection. The session's stale-data flag is committed only once the
/// stream is fully configured. The caller must drain the stream and then read
/// the final transfer reply.
///
/// # Arguments
///
/// * `control` - The control connection, held exclusively for the whole sequence.
/// * `factory` - Opens the data connection and sends `RETR` on it.
/// * `request` - Path, representation type, length hint, restart offset and stale-data flag.
/// * `token` - Cancels the command sequence.
///
/// # Returns
///
/// Result<Option<TransferStream>, FtpError>: `Ok(None)` when the data connection
/// could not be established, a protocol error when the server refuses a step.
pub async fn open_read(
    control: &mut ControlConnection,
    factory: &dyn DataChannelFactory,
    request: &TransferRequest,
    token: &CancellationToken,
) -> Result<Option<TransferStream>, FtpError> {
    if is_blank(&request.path) {
        return Err(FtpError::InvalidArgument("path"));
    }

    let path = ftp_path(&request.path);
    info!(
        "open_read({:?}, {}, {}, {})",
        path, request.data_type, request.restart, request.length_hint
    );

    let length = resolve_length(control, &path, request.length_hint, token).await?;
    set_data_type(control, request.data_type, token).await?;

    let command = Command::new(FtpCommand::RETR, path.as_str());
    let stream = factory
        .open(control, &command, request.restart, token)
        .await?
        .map(|data| configure_stream(data, &path, length, request.restart));

    if stream.is_none() {
        warn!("No data channel for RETR {}", path);
    }

    control
        .session_mut()
        .begin_stream(&path, request.ignore_stale_data);

    Ok(stream)
}
