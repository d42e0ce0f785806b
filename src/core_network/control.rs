use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::Command;
use crate::core_ftpcommand::reply::{FtpReply, ParseStep, ReplyParser};
use crate::core_network::stream::BoxedStream;
use crate::session::SessionState;
use log::{debug, trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Reads one complete reply from a control connection.
pub async fn read_reply<R>(reader: &mut R) -> Result<FtpReply, FtpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = ReplyParser::new();
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(FtpError::ConnectionClosed);
        }
        trace!("< {}", line.trim_end());
        if let ParseStep::Done(reply) = parser.feed(&line)? {
            debug!("< {}", reply);
            return Ok(reply);
        }
    }
}

/// Writes one command line, CRLF terminated.
pub async fn write_command<W>(writer: &mut W, command: &Command) -> Result<(), FtpError>
where
    W: AsyncWrite + Unpin,
{
    debug!("> {}", command);
    writer
        .write_all(format!("{}\r\n", command.to_line()).as_bytes())
        .await?;
    writer.flush().await?;
    Ok(())
}

/// The control connection: one command in flight, one reply per command.
///
/// Owns the session state of the connection. Callers that need several
/// commands to run back to back must hold exclusive access to the
/// connection for the whole sequence.
pub struct ControlConnection {
    reader: BufReader<BoxedStream>,
    session: SessionState,
    peer_addr: Option<SocketAddr>,
    read_timeout: Option<Duration>,
    owed_replies: usize,
    early_final_reply: Option<FtpReply>,
}

impl ControlConnection {
    pub fn new(stream: BoxedStream) -> Self {
        Self {
            reader: BufReader::new(stream),
            session: SessionState::default(),
            peer_addr: None,
            read_timeout: None,
            owed_replies: 0,
            early_final_reply: None,
        }
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// True while the server still owes replies to abandoned commands.
    /// They are read and discarded before anything else goes out.
    pub fn is_interrupted(&self) -> bool {
        self.owed_replies > 0
    }

    /// Sends `command` and returns its reply, whatever the status.
    pub async fn send_command(
        &mut self,
        command: &Command,
        token: &CancellationToken,
    ) -> Result<FtpReply, FtpError> {
        self.early_final_reply = None;
        let recovered = self.settle_owed_replies(token).await?;
        self.drain_stale(recovered).await?;

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(FtpError::Cancelled),
            reply = self.round_trip(command) => reply,
        };

        if let Err(e @ (FtpError::Cancelled | FtpError::Timeout(_))) = &result {
            warn!("{} abandoned: {}", command.verb(), e);
        }
        result
    }

    /// Sends `command` and fails with [`FtpError::Command`] unless the reply
    /// is a success.
    pub async fn execute(
        &mut self,
        command: &Command,
        token: &CancellationToken,
    ) -> Result<FtpReply, FtpError> {
        let reply = self.send_command(command, token).await?;
        if !reply.is_success() {
            return Err(FtpError::Command(reply));
        }
        Ok(reply)
    }

    /// Reads the next reply without sending anything, e.g. the final reply
    /// of a transfer.
    pub async fn get_reply(&mut self, token: &CancellationToken) -> Result<FtpReply, FtpError> {
        self.settle_owed_replies(token).await?;
        self.owed_replies += 1;
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FtpError::Cancelled),
            reply = self.read_owed_reply() => reply,
        }
    }

    /// Final reply of the transfer in progress. Servers that skip the `1xx`
    /// mark have already sent it with the transfer command.
    pub async fn transfer_reply(&mut self, token: &CancellationToken) -> Result<FtpReply, FtpError> {
        match self.early_final_reply.take() {
            Some(reply) => Ok(reply),
            None => self.get_reply(token).await,
        }
    }

    pub(crate) fn record_final_reply(&mut self, reply: FtpReply) {
        self.early_final_reply = Some(reply);
    }

    /// The transfer in progress was dropped before its final reply was read.
    pub(crate) fn abandon_transfer(&mut self) {
        if self.early_final_reply.take().is_none() {
            self.owed_replies += 1;
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), FtpError> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    async fn round_trip(&mut self, command: &Command) -> Result<FtpReply, FtpError> {
        write_command(self.reader.get_mut(), command).await?;
        self.owed_replies += 1;
        self.read_owed_reply().await
    }

    /// Reads a reply the server owes. The debt stays open when the read
    /// times out or the future is dropped.
    async fn read_owed_reply(&mut self) -> Result<FtpReply, FtpError> {
        let result = self.timed_read().await;
        if !matches!(result, Err(FtpError::Timeout(_))) {
            self.owed_replies = self.owed_replies.saturating_sub(1);
        }
        result
    }

    /// Reads and discards the replies to abandoned commands, so the next
    /// command cannot pick one of them up as its own. Returns whether any
    /// reply was discarded.
    async fn settle_owed_replies(&mut self, token: &CancellationToken) -> Result<bool, FtpError> {
        let mut discarded = false;
        while self.owed_replies > 0 {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FtpError::Cancelled),
                reply = self.timed_read() => reply,
            };
            match result {
                Ok(reply) => {
                    debug!("Discarded reply to an abandoned command: {}", reply);
                    discarded = true;
                    if !reply.is_preliminary() {
                        self.owed_replies -= 1;
                    }
                }
                Err(FtpError::Timeout(_)) => {
                    warn!("Server still owes {} reply(ies), reconnect", self.owed_replies);
                    return Err(FtpError::Timeout("waiting for the reply to an abandoned command"));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(discarded)
    }

    async fn timed_read(&mut self) -> Result<FtpReply, FtpError> {
        match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read_reply(&mut self.reader))
                .await
                .map_err(|_| FtpError::Timeout("waiting for a reply"))?,
            None => read_reply(&mut self.reader).await,
        }
    }

    /// Consumes whatever is already waiting on the connection before a new
    /// command goes out.
    async fn drain_stale(&mut self, recovered: bool) -> Result<(), FtpError> {
        let tolerate = self.session.ignore_stale_data || recovered;
        let mut stale = String::new();

        loop {
            let n = match tokio::time::timeout(Duration::ZERO, self.reader.fill_buf()).await {
                Ok(Ok(buf)) => {
                    stale.push_str(&String::from_utf8_lossy(buf));
                    buf.len()
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => 0,
            };
            if n == 0 {
                break;
            }
            self.reader.consume(n);
        }

        self.session.ignore_stale_data = false;

        if stale.is_empty() {
            return Ok(());
        }
        if tolerate {
            debug!("Discarded stale data: {}", stale.trim_end());
            Ok(())
        } else {
            warn!("Unexpected data on the control connection: {}", stale.trim_end());
            Err(FtpError::StaleData(stale))
        }
    }
}
