use crate::core_network::control::ControlConnection;
use crate::session::SessionState;
use log::debug;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::OwnedMutexGuard;

/// Anything a control or data connection can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// Exclusive hold on a control connection for the life of one transfer.
pub type ControlLease = OwnedMutexGuard<ControlConnection>;

/// The byte stream of one transfer, owning its data connection.
///
/// `position` is the offset in the remote object and advances with every
/// byte read or written. `length` is only known when the size was resolved
/// to a positive value.
///
/// A stream opened through a client holds that client's control connection
/// until the final reply is read, so no other command can slip in between
/// the transfer command and its completion reply. Dropping the stream
/// releases the connection; its final reply is then discarded before the
/// next command.
pub struct TransferStream {
    inner: BoxedStream,
    path: String,
    length: Option<u64>,
    position: u64,
    lease: Option<ControlLease>,
}

impl TransferStream {
    pub fn new(inner: BoxedStream, path: impl Into<String>) -> Self {
        Self {
            inner,
            path: path.into(),
            length: None,
            position: 0,
            lease: None,
        }
    }

    pub(crate) fn with_lease(mut self, lease: ControlLease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub(crate) fn take_lease(&mut self) -> Option<ControlLease> {
        self.lease.take()
    }

    /// State of the session the stream belongs to, while it holds it.
    pub fn session(&self) -> Option<&SessionState> {
        self.lease.as_deref().map(ControlConnection::session)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn set_length(&mut self, length: u64) {
        self.length = Some(length);
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Bytes left before the known end of the object.
    pub fn remaining(&self) -> Option<u64> {
        self.length.map(|len| len.saturating_sub(self.position))
    }

}

impl Drop for TransferStream {
    fn drop(&mut self) {
        if let Some(control) = self.lease.as_mut() {
            debug!("Transfer of {} dropped before its final reply", self.path);
            control.abandon_transfer();
        }
    }
}

impl fmt::Debug for TransferStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferStream")
            .field("path", &self.path)
            .field("length", &self.length)
            .field("position", &self.position)
            .field("leased", &self.lease.is_some())
            .finish()
    }
}

impl AsyncRead for TransferStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            self.position += (buf.filled().len() - before) as u64;
        }
        poll
    }
}

impl AsyncWrite for TransferStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            self.position += n as u64;
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_position_advances_from_restart_offset() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = TransferStream::new(Box::new(client), "/a.bin");
        stream.set_length(110);
        stream.set_position(100);

        server.write_all(b"0123456789").await.unwrap();
        drop(server);

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf.len(), 10);
        assert_eq!(stream.position(), 110);
        assert_eq!(stream.remaining(), Some(0));
    }

    #[tokio::test]
    async fn test_writes_count_towards_position() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = TransferStream::new(Box::new(client), "/up.txt");
        stream.write_all(b"hello").await.unwrap();
        stream.shutdown().await.unwrap();

        let mut buf = Vec::new();
        server.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello");
        assert_eq!(stream.position(), 5);
        assert_eq!(stream.length(), None);
        assert_eq!(stream.remaining(), None);
    }

    #[tokio::test]
    async fn test_leased_stream_holds_control_until_dropped() {
        let (control, _server) = tokio::io::duplex(64);
        let shared = Arc::new(Mutex::new(ControlConnection::new(Box::new(control))));
        let (data, _peer) = tokio::io::duplex(64);

        let lease = Arc::clone(&shared).lock_owned().await;
        let stream = TransferStream::new(Box::new(data), "/a.bin").with_lease(lease);
        assert!(shared.try_lock().is_err());
        assert_eq!(stream.session().map(|s| s.ignore_stale_data), Some(false));

        drop(stream);
        let control = shared.try_lock().unwrap();
        assert!(control.is_interrupted());
    }
}
