//! Synchronous client built on the asynchronous core.
//!
//! Every call blocks the calling thread until its whole command sequence is
//! done. Do not use it from inside a Tokio runtime.
//!
//! An open [`BlockingTransferStream`] holds the control connection: pass it
//! to [`BlockingFtpClient::finish_transfer`] (or drop it) before calling the
//! client again from the same thread.

use crate::config::ClientConfig;
use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::reply::FtpReply;
use crate::core_ftpcommand::size::LengthHint;
use crate::core_ftpcommand::type_::FtpDataType;
use crate::core_network::stream::TransferStream;
use crate::session::{FtpClient, SessionState};
use std::io::{self, Read, Write};
use tokio::runtime::{Builder, Runtime};
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;

pub struct BlockingFtpClient {
    runtime: Runtime,
    inner: FtpClient,
}

fn runtime() -> Result<Runtime, FtpError> {
    Ok(Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("rouilleftp-io")
        .enable_all()
        .build()?)
}

impl BlockingFtpClient {
    pub fn connect(config: &ClientConfig) -> Result<Self, FtpError> {
        let runtime = runtime()?;
        let inner = runtime.block_on(FtpClient::connect(config))?;
        Ok(Self { runtime, inner })
    }

    pub fn session_state(&self) -> SessionState {
        self.runtime.block_on(self.inner.session_state())
    }

    pub fn open_read(
        &self,
        path: &str,
        data_type: FtpDataType,
        restart: u64,
        length_hint: LengthHint,
    ) -> Result<Option<BlockingTransferStream>, FtpError> {
        let token = CancellationToken::new();
        let stream = self.runtime.block_on(self.inner.open_read_with_length(
            path,
            data_type,
            restart,
            length_hint,
            &token,
        ))?;
        Ok(stream.map(|s| self.bridge(s)))
    }

    pub fn open_write(
        &self,
        path: &str,
        data_type: FtpDataType,
        length_hint: LengthHint,
    ) -> Result<Option<BlockingTransferStream>, FtpError> {
        let token = CancellationToken::new();
        let stream = self.runtime.block_on(self.inner.open_write_with_length(
            path,
            data_type,
            length_hint,
            &token,
        ))?;
        Ok(stream.map(|s| self.bridge(s)))
    }

    pub fn finish_transfer(&self, stream: BlockingTransferStream) -> Result<FtpReply, FtpError> {
        let token = CancellationToken::new();
        let stream = stream.bridge.into_inner();
        self.runtime
            .block_on(self.inner.finish_transfer(stream, &token))
    }

    pub fn rename(&self, path: &str, dest: &str) -> Result<(), FtpError> {
        let token = CancellationToken::new();
        self.runtime.block_on(self.inner.rename(path, dest, &token))
    }

    pub fn file_size(&self, path: &str) -> Result<u64, FtpError> {
        let token = CancellationToken::new();
        self.runtime.block_on(self.inner.file_size(path, &token))
    }

    pub fn quit(&self) -> Result<(), FtpError> {
        self.runtime.block_on(self.inner.quit())
    }

    fn bridge(&self, stream: TransferStream) -> BlockingTransferStream {
        BlockingTransferStream {
            length: stream.length(),
            position: stream.position(),
            bridge: SyncIoBridge::new_with_handle(stream, self.runtime.handle().clone()),
        }
    }
}

/// A [`TransferStream`] usable with `std::io::Read` and `std::io::Write`.
pub struct BlockingTransferStream {
    bridge: SyncIoBridge<TransferStream>,
    length: Option<u64>,
    position: u64,
}

impl BlockingTransferStream {
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Read for BlockingTransferStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.bridge.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Write for BlockingTransferStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.bridge.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.bridge.flush()
    }
}
