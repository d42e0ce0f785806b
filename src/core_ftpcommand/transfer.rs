use crate::core_ftpcommand::size::LengthHint;
use crate::core_ftpcommand::type_::FtpDataType;
use crate::core_network::stream::{BoxedStream, TransferStream};

/// Everything needed to open one side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub path: String,
    pub data_type: FtpDataType,
    pub length_hint: LengthHint,
    /// Offset to resume from; `0` starts at the beginning. Reads only.
    pub restart: u64,
    /// Tolerate leftover control data from this transfer on the next command.
    pub ignore_stale_data: bool,
}

impl TransferRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data_type: FtpDataType::Binary,
            length_hint: LengthHint::Unknown,
            restart: 0,
            ignore_stale_data: false,
        }
    }

    pub fn data_type(mut self, data_type: FtpDataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn length_hint(mut self, hint: LengthHint) -> Self {
        self.length_hint = hint;
        self
    }

    pub fn restart(mut self, offset: u64) -> Self {
        self.restart = offset;
        self
    }

    pub fn ignore_stale_data(mut self, ignore: bool) -> Self {
        self.ignore_stale_data = ignore;
        self
    }
}

/// Wraps an open data connection. The length is applied only when positive
/// and the position only when resuming, so a stream that opened is never
/// given values the server did not confirm.
pub(crate) fn configure_stream(
    data: BoxedStream,
    path: &str,
    length: Option<u64>,
    restart: u64,
) -> TransferStream {
    let mut stream = TransferStream::new(data, path);
    if let Some(length) = length.filter(|len| *len > 0) {
        stream.set_length(length);
    }
    if restart > 0 {
        stream.set_position(restart);
    }
    stream
}
