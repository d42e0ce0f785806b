use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_network::control::ControlConnection;
use crate::core_network::pasv::{negotiate_passive, PassiveMode};
use crate::core_network::stream::BoxedStream;
use crate::core_tls::TlsConnection;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Opens the data connection that goes with a transfer command.
///
/// `Ok(None)` means no data connection could be established. It is an
/// expected outcome the caller branches on, not an error.
#[async_trait]
pub trait DataChannelFactory: Send + Sync {
    async fn open(
        &self,
        control: &mut ControlConnection,
        command: &Command,
        restart: u64,
        token: &CancellationToken,
    ) -> Result<Option<BoxedStream>, FtpError>;
}

/// Passive-mode data connections, optionally protected with TLS.
pub struct PassiveDataChannelFactory {
    mode: PassiveMode,
    tls: Option<TlsConnection>,
    connect_timeout: Option<Duration>,
}

impl PassiveDataChannelFactory {
    pub fn new(mode: PassiveMode) -> Self {
        Self {
            mode,
            tls: None,
            connect_timeout: None,
        }
    }

    pub fn with_tls(mut self, tls: Option<TlsConnection>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn dial(&self, target: SocketAddr) -> std::io::Result<TcpStream> {
        match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, TcpStream::connect(target))
                .await
                .map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "data connection timed out")
                })?,
            None => TcpStream::connect(target).await,
        }
    }
}

#[async_trait]
impl DataChannelFactory for PassiveDataChannelFactory {
    async fn open(
        &self,
        control: &mut ControlConnection,
        command: &Command,
        restart: u64,
        token: &CancellationToken,
    ) -> Result<Option<BoxedStream>, FtpError> {
        let target = negotiate_passive(control, self.mode, token).await?;

        let dialed = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FtpError::Cancelled),
            dialed = self.dial(target) => dialed,
        };
        let stream = match dialed {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Can't open data connection to {}: {}", target, e);
                return Ok(None);
            }
        };
        debug!("Data connection established with {}", target);

        if restart > 0 {
            control
                .execute(&Command::new(FtpCommand::REST, restart.to_string()), token)
                .await?;
        }

        let reply = control.execute(command, token).await?;
        if !reply.is_preliminary() {
            debug!("{} completed without a 1xx mark: {}", command.verb(), reply);
            control.record_final_reply(reply);
        }

        let stream: BoxedStream = match &self.tls {
            Some(tls) => Box::new(tls.connect_tls(stream).await?),
            None => Box::new(stream),
        };

        info!("Data channel open for {}", command);
        Ok(Some(stream))
    }
}
