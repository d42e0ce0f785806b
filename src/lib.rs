//! Client-side FTP/FTPS transfer engine.
//!
//! [`FtpClient`] drives one control connection: it resolves sizes, sets the
//! representation type, opens data connections for `RETR`/`STOR`, and runs
//! the `RNFR`/`RNTO` rename pair. [`blocking::BlockingFtpClient`] offers the
//! same operations to synchronous callers.

pub mod blocking;
pub mod config;
pub mod constants;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_tls;
pub mod helpers;
pub mod session;

pub use config::{ClientConfig, Config};
pub use core_ftpcommand::{Command, FtpCommand, FtpDataType, FtpError, FtpReply, LengthHint, TransferRequest};
pub use core_network::{ControlConnection, DataChannelFactory, PassiveDataChannelFactory, TransferStream};
pub use session::{FtpClient, SessionState};
pub use tokio_util::sync::CancellationToken;
