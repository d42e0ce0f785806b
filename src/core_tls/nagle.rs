// Send-coalescing (Nagle) control around TLS handshakes
use log::{debug, warn};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;

/// A transport whose send-coalescing can be toggled.
pub trait Coalescing {
    /// `true` sends every write immediately, `false` lets the stack batch segments.
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()>;
}

impl Coalescing for std::net::TcpStream {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        std::net::TcpStream::set_nodelay(self, nodelay)
    }
}

impl Coalescing for TcpStream {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        TcpStream::set_nodelay(self, nodelay)
    }
}

impl<T: Coalescing + ?Sized> Coalescing for &T {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        (**self).set_nodelay(nodelay)
    }
}

impl<T: Coalescing + ?Sized> Coalescing for Arc<T> {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        (**self).set_nodelay(nodelay)
    }
}

/// Keeps coalescing disabled on a socket while it is alive.
///
/// [`LatencyTuner::suspend`] turns coalescing off so handshake round trips
/// leave immediately. Coalescing is turned back on exactly once, either by
/// [`LatencyTuner::resume`] or when the tuner is dropped on an error or
/// cancellation path.
#[derive(Debug)]
pub struct LatencyTuner<S: Coalescing> {
    socket: S,
    suspended: bool,
}

impl<S: Coalescing> LatencyTuner<S> {
    pub fn suspend(socket: S) -> io::Result<Self> {
        socket.set_nodelay(true)?;
        debug!("Send coalescing suspended for handshake");
        Ok(Self {
            socket,
            suspended: true,
        })
    }

    pub fn resume(mut self) -> io::Result<()> {
        self.suspended = false;
        self.socket.set_nodelay(false)?;
        debug!("Send coalescing resumed");
        Ok(())
    }
}

impl<S: Coalescing> Drop for LatencyTuner<S> {
    fn drop(&mut self) {
        if self.suspended {
            self.suspended = false;
            if let Err(e) = self.socket.set_nodelay(false) {
                warn!("Failed to re-enable send coalescing: {}", e);
            } else {
                debug!("Send coalescing resumed after an aborted handshake");
            }
        }
    }
}

/// Runs `handshake` with coalescing disabled on `socket`.
///
/// Coalescing is restored on every exit path. A failure to restore it after
/// a successful handshake is reported; after a failed handshake the
/// handshake's own error wins.
pub async fn with_coalescing_suspended<S, F, T, E>(socket: S, handshake: F) -> Result<T, E>
where
    S: Coalescing,
    F: Future<Output = Result<T, E>>,
    E: From<io::Error>,
{
    let tuner = LatencyTuner::suspend(socket)?;
    match handshake.await {
        Ok(value) => {
            tuner.resume()?;
            Ok(value)
        }
        Err(e) => {
            drop(tuner);
            Err(e)
        }
    }
}

/// Splits off a second handle on the same socket so its options can be
/// changed while the stream itself is owned by a TLS connector.
pub fn coalescing_handle(stream: TcpStream) -> io::Result<(TcpStream, std::net::TcpStream)> {
    let std_stream = stream.into_std()?;
    let handle = std_stream.try_clone()?;
    let stream = TcpStream::from_std(std_stream)?;
    Ok((stream, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSocket {
        calls: Mutex<Vec<bool>>,
    }

    impl Coalescing for RecordingSocket {
        fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
            self.calls.lock().unwrap().push(nodelay);
            Ok(())
        }
    }

    fn resumes(socket: &RecordingSocket) -> usize {
        socket.calls.lock().unwrap().iter().filter(|v| !**v).count()
    }

    #[test]
    fn test_explicit_resume_runs_once() {
        let socket = RecordingSocket::default();
        let tuner = LatencyTuner::suspend(&socket).unwrap();
        tuner.resume().unwrap();
        assert_eq!(*socket.calls.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_drop_resumes() {
        let socket = RecordingSocket::default();
        {
            let _tuner = LatencyTuner::suspend(&socket).unwrap();
        }
        assert_eq!(*socket.calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_failed_handshake_resumes_exactly_once() {
        let socket = RecordingSocket::default();
        let result: Result<(), io::Error> = with_coalescing_suspended(&socket, async {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "handshake failed"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(resumes(&socket), 1);
        assert_eq!(socket.calls.lock().unwrap()[0], true);
    }

    #[tokio::test]
    async fn test_successful_handshake_resumes_exactly_once() {
        let socket = RecordingSocket::default();
        let value: Result<u8, io::Error> =
            with_coalescing_suspended(&socket, async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
        assert_eq!(*socket.calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_real_socket_handle_shares_options() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (client, handle) = coalescing_handle(client).unwrap();

        let tuner = LatencyTuner::suspend(&handle).unwrap();
        assert!(client.nodelay().unwrap());
        drop(tuner);
        assert!(!client.nodelay().unwrap());
    }
}
