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

/// Opens `request.path` for writing with `STOR`.
///
/// Uploads always start at offset zero; `request.restart` is not used. When
/// the hint asks for it, the current size of the remote object is resolved
/// and recorded as the stream length. The caller must shut the stream down and
/// then read the final transfer reply.
///
/// # Arguments
///
/// * `control` - The control connection, held exclusively for the whole sequence.
/// * `factory` - Opens the data connection and sends `STOR` on it.
/// * `request` - Path, representation type, length hint and stale-data flag.
/// * `token` - Cancels the command sequence.
///
/// # Returns
///
/// Result<Option<TransferStream>, FtpError>: `Ok(None)` when the data connection
/// could not be established.
pub async fn open_write(
    control: &mut ControlConnection,
    factory: &dyn DataChannelFactory,
    request: &TransferRequest,
    token: &CancellationToken,
) -> Result<Option<TransferStream>, FtpError> {
    if is_blank(&request.path) {
        return Err(FtpError::InvalidArgument("path"));
    }

    let path = ftp_path(&request.path);
    info!("open_write({:?}, {})", path, request.data_type);

    let length = resolve_length(control, &path, request.length_hint, token).await?;
    set_data_type(control, request.data_type, token).await?;

    let command = Command::new(FtpCommand::STOR, path.as_str());
    let stream = factory
        .open(control, &command, 0, token)
        .await?
        .map(|data| configure_stream(data, &path, length, 0));

    if stream.is_none() {
        warn!("No data channel for STOR {}", path);
    }

    control
        .session_mut()
        .begin_stream(&path, request.ignore_stale_data);

    Ok(stream)
}
