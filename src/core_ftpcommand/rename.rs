use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::pwd::get_absolute_path;
use crate::core_network::control::ControlConnection;
use crate::helpers::{ftp_path, is_blank};
use log::{error, info};
use tokio_util::sync::CancellationToken;

/// Renames `path` to `dest` with `RNFR` then `RNTO`.
///
/// Both paths are made absolute first. `RNTO` is never sent when `RNFR`
/// fails. If `RNTO` fails the rename is reported as failed and nothing is
/// rolled back: callers must not treat the pair as a transaction.
///
/// # Arguments
///
/// * `control` - The control connection, held exclusively for the whole sequence.
/// * `path` - The current name of the file or directory.
/// * `dest` - The new name.
/// * `token` - Cancels the command sequence.
///
/// # Returns
///
/// Result<(), FtpError> with the reply of the step that failed, if any.
pub async fn rename(
    control: &mut ControlConnection,
    path: &str,
    dest: &str,
    token: &CancellationToken,
) -> Result<(), FtpError> {
    if is_blank(path) {
        return Err(FtpError::InvalidArgument("path"));
    }
    if is_blank(dest) {
        return Err(FtpError::InvalidArgument("dest"));
    }

    let path = ftp_path(path);
    let dest = ftp_path(dest);
    info!("rename({:?}, {:?})", path, dest);

    let path = get_absolute_path(control, &path, token).await?;
    let dest = get_absolute_path(control, &dest, token).await?;

    if let Err(e) = control
        .execute(&Command::new(FtpCommand::RNFR, path.as_str()), token)
        .await
    {
        error!("RNFR {} failed: {}", path, e);
        return Err(e);
    }

    if let Err(e) = control
        .execute(&Command::new(FtpCommand::RNTO, dest.as_str()), token)
        .await
    {
        error!(
            "RNTO {} failed after RNFR {} was accepted, no rollback attempted: {}",
            dest, path, e
        );
        return Err(e);
    }

    Ok(())
}
