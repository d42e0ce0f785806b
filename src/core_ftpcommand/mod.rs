// The FTP commands the client issues, one file per operation
pub mod error;
pub mod ftpcommand;
pub mod pwd;
pub mod rename;
pub mod reply;
pub mod retr;
pub mod size;
pub mod stor;
pub mod transfer;
pub mod type_;

pub use error::FtpError;
pub use ftpcommand::{Command, FtpCommand};
pub use reply::FtpReply;
pub use size::LengthHint;
pub use transfer::TransferRequest;
pub use type_::FtpDataType;
