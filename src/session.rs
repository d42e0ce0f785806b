use crate::config::ClientConfig;
use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::reply::FtpReply;
use crate::core_ftpcommand::size::LengthHint;
use crate::core_ftpcommand::transfer::TransferRequest;
use crate::core_ftpcommand::type_::FtpDataType;
use crate::core_ftpcommand::{pwd, rename, retr, size, stor, type_};
use crate::core_network::control::{read_reply, write_command, ControlConnection};
use crate::core_network::data::{DataChannelFactory, PassiveDataChannelFactory};
use crate::core_network::stream::TransferStream;
use crate::core_tls::{TlsConnection, TlsError};
use crate::helpers::{ftp_path, is_blank};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Mutable state scoped to one control connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Remote path of the last stream handed to a caller.
    pub last_stream_path: Option<String>,
    /// Leftover control data is discarded instead of failing the next command.
    pub ignore_stale_data: bool,
    /// Representation type last acknowledged by the server.
    pub current_data_type: Option<FtpDataType>,
}

impl SessionState {
    /// Records a stream about to be returned to the caller. Must run after
    /// the stream is configured and before any byte moves.
    pub fn begin_stream(&mut self, path: &str, ignore_stale_data: bool) {
        self.last_stream_path = Some(path.to_string());
        self.ignore_stale_data = ignore_stale_data;
    }
}

/// Asynchronous FTP client over a single control connection.
///
/// Every multi-command operation holds the control connection for its whole
/// sequence, so concurrent callers queue up instead of interleaving their
/// commands and replies. A transfer holds it from the opening command until
/// [`FtpClient::finish_transfer`] or until its stream is dropped; other calls
/// on the same client wait meanwhile. Clones share the connection.
#[derive(Clone)]
pub struct FtpClient {
    control: Arc<Mutex<ControlConnection>>,
    factory: Arc<dyn DataChannelFactory>,
}

impl FtpClient {
    pub fn with_connection(control: ControlConnection, factory: Arc<dyn DataChannelFactory>) -> Self {
        Self {
            control: Arc::new(Mutex::new(control)),
            factory,
        }
    }

    /// Connects, secures the control connection when configured, and logs in.
    pub async fn connect(config: &ClientConfig) -> Result<Self, FtpError> {
        let addr = format!("{}:{}", config.host, config.port);
        info!("Connecting to {}", addr);

        let tcp = match config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, TcpStream::connect(&addr))
                .await
                .map_err(|_| FtpError::Timeout("connecting"))??,
            None => TcpStream::connect(&addr).await?,
        };
        let peer = tcp.peer_addr()?;
        let token = CancellationToken::new();

        let (control, data_tls) = if config.tls.is_enabled() {
            let tls = TlsConnection::new(&config.tls, &config.host)?;
            let tls_stream = secure_control(tcp, &tls).await?;
            (ControlConnection::new(Box::new(tls_stream)), Some(tls))
        } else {
            let mut control = ControlConnection::new(Box::new(tcp));
            let greeting = control.get_reply(&token).await?;
            check_greeting(greeting)?;
            (control, None)
        };

        let mut control = control
            .with_peer_addr(peer)
            .with_read_timeout(config.read_timeout());

        login(&mut control, config, &token).await?;

        if data_tls.is_some() {
            control
                .execute(&Command::new(FtpCommand::PBSZ, "0"), &token)
                .await?;
            control
                .execute(&Command::new(FtpCommand::PROT, "P"), &token)
                .await?;
        }

        let factory = PassiveDataChannelFactory::new(config.passive_mode)
            .with_tls(data_tls)
            .with_connect_timeout(config.connect_timeout());

        info!("Connected to {} as {}", addr, config.username);
        Ok(Self::with_connection(control, Arc::new(factory)))
    }

    /// Snapshot of the session state.
    pub async fn session_state(&self) -> SessionState {
        self.control.lock().await.session().clone()
    }

    pub async fn is_interrupted(&self) -> bool {
        self.control.lock().await.is_interrupted()
    }

    /// Opens a file for reading. With `check_if_file_exists` the size is
    /// queried and recorded as the stream length.
    pub async fn open_read(
        &self,
        path: &str,
        data_type: FtpDataType,
        restart: u64,
        check_if_file_exists: bool,
    ) -> Result<Option<TransferStream>, FtpError> {
        let hint = if check_if_file_exists {
            LengthHint::Unknown
        } else {
            LengthHint::Irrelevant
        };
        self.open_read_with_length(path, data_type, restart, hint, &CancellationToken::new())
            .await
    }

    pub async fn open_read_with_length(
        &self,
        path: &str,
        data_type: FtpDataType,
        restart: u64,
        length_hint: LengthHint,
        token: &CancellationToken,
    ) -> Result<Option<TransferStream>, FtpError> {
        let request = TransferRequest::new(path)
            .data_type(data_type)
            .restart(restart)
            .length_hint(length_hint)
            .ignore_stale_data(true);
        self.open_read_internal(&request, token).await
    }

    pub async fn open_read_internal(
        &self,
        request: &TransferRequest,
        token: &CancellationToken,
    ) -> Result<Option<TransferStream>, FtpError> {
        let mut control = Arc::clone(&self.control).lock_owned().await;
        let stream = retr::open_read(&mut control, self.factory.as_ref(), request, token).await?;
        Ok(stream.map(|stream| stream.with_lease(control)))
    }

    /// Opens a file for writing. With `check_if_file_exists` the current
    /// remote size is queried and recorded as the stream length.
    pub async fn open_write(
        &self,
        path: &str,
        data_type: FtpDataType,
        check_if_file_exists: bool,
        token: &CancellationToken,
    ) -> Result<Option<TransferStream>, FtpError> {
        let hint = if check_if_file_exists {
            LengthHint::Unknown
        } else {
            LengthHint::Irrelevant
        };
        self.open_write_with_length(path, data_type, hint, token)
            .await
    }

    pub async fn open_write_with_length(
        &self,
        path: &str,
        data_type: FtpDataType,
        length_hint: LengthHint,
        token: &CancellationToken,
    ) -> Result<Option<TransferStream>, FtpError> {
        let request = TransferRequest::new(path)
            .data_type(data_type)
            .length_hint(length_hint)
            .ignore_stale_data(true);
        self.open_write_internal(&request, token).await
    }

    pub async fn open_write_internal(
        &self,
        request: &TransferRequest,
        token: &CancellationToken,
    ) -> Result<Option<TransferStream>, FtpError> {
        let mut control = Arc::clone(&self.control).lock_owned().await;
        let stream = stor::open_write(&mut control, self.factory.as_ref(), request, token).await?;
        Ok(stream.map(|stream| stream.with_lease(control)))
    }

    /// Closes a drained transfer stream and reads the server's final reply,
    /// then releases the control connection to the next caller.
    pub async fn finish_transfer(
        &self,
        mut stream: TransferStream,
        token: &CancellationToken,
    ) -> Result<FtpReply, FtpError> {
        let path = stream.path().to_string();
        if let Err(e) = stream.shutdown().await {
            debug!("Data connection for {} already closed: {}", path, e);
        }
        let lease = stream.take_lease();
        drop(stream);

        let mut control = match lease {
            Some(lease) => lease,
            None => Arc::clone(&self.control).lock_owned().await,
        };
        let reply = control.transfer_reply(token).await?;
        control.session_mut().ignore_stale_data = false;
        if !reply.is_success() {
            warn!("Transfer of {} failed: {}", path, reply);
            return Err(FtpError::Command(reply));
        }
        info!("Transfer of {} complete: {}", path, reply);
        Ok(reply)
    }

    pub async fn rename(
        &self,
        path: &str,
        dest: &str,
        token: &CancellationToken,
    ) -> Result<(), FtpError> {
        let mut control = self.control.lock().await;
        rename::rename(&mut control, path, dest, token).await
    }

    /// Size of a remote file, failing when the server cannot report it.
    pub async fn file_size(&self, path: &str, token: &CancellationToken) -> Result<u64, FtpError> {
        if is_blank(path) {
            return Err(FtpError::InvalidArgument("path"));
        }
        let path = ftp_path(path);
        let mut control = self.control.lock().await;
        size::file_size(&mut control, &path, token).await
    }

    /// Size of a remote file, `None` when the server cannot report it.
    pub async fn get_file_size(
        &self,
        path: &str,
        token: &CancellationToken,
    ) -> Result<Option<u64>, FtpError> {
        if is_blank(path) {
            return Err(FtpError::InvalidArgument("path"));
        }
        let path = ftp_path(path);
        let mut control = self.control.lock().await;
        size::get_file_size(&mut control, &path, token).await
    }

    pub async fn set_data_type(
        &self,
        data_type: FtpDataType,
        token: &CancellationToken,
    ) -> Result<(), FtpError> {
        let mut control = self.control.lock().await;
        type_::set_data_type(&mut control, data_type, token).await
    }

    pub async fn get_working_directory(&self, token: &CancellationToken) -> Result<String, FtpError> {
        let mut control = self.control.lock().await;
        pwd::get_working_directory(&mut control, token).await
    }

    pub async fn get_absolute_path(
        &self,
        path: &str,
        token: &CancellationToken,
    ) -> Result<String, FtpError> {
        let mut control = self.control.lock().await;
        pwd::get_absolute_path(&mut control, path, token).await
    }

    /// Sends a raw command, failing on a non-success reply.
    pub async fn execute(
        &self,
        command: &Command,
        token: &CancellationToken,
    ) -> Result<FtpReply, FtpError> {
        self.control.lock().await.execute(command, token).await
    }

    /// Reads the next reply, e.g. the final reply of a transfer.
    pub async fn get_reply(&self, token: &CancellationToken) -> Result<FtpReply, FtpError> {
        self.control.lock().await.get_reply(token).await
    }

    pub async fn quit(&self) -> Result<(), FtpError> {
        let mut control = self.control.lock().await;
        let token = CancellationToken::new();
        match control
            .send_command(&Command::bare(FtpCommand::QUIT), &token)
            .await
        {
            Ok(reply) => debug!("QUIT: {}", reply),
            Err(e) => debug!("QUIT failed, closing anyway: {}", e),
        }
        control.shutdown().await
    }
}

fn check_greeting(greeting: FtpReply) -> Result<(), FtpError> {
    if greeting.is_success() {
        info!("Server ready: {}", greeting.message);
        Ok(())
    } else {
        Err(FtpError::Command(greeting))
    }
}

/// Reads the greeting, asks for `AUTH TLS`, and performs the handshake.
async fn secure_control(
    mut tcp: TcpStream,
    tls: &TlsConnection,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>, FtpError> {
    {
        let mut reader = BufReader::new(&mut tcp);
        check_greeting(read_reply(&mut reader).await?)?;

        write_command(reader.get_mut(), &Command::new(FtpCommand::AUTH, "TLS")).await?;
        let reply = read_reply(&mut reader).await?;
        if reply.code != 234 {
            return Err(TlsError::AuthRefused(reply.to_string()).into());
        }
    }
    Ok(tls.connect_tls(tcp).await?)
}

async fn login(
    control: &mut ControlConnection,
    config: &ClientConfig,
    token: &CancellationToken,
) -> Result<(), FtpError> {
    let reply = control
        .execute(&Command::new(FtpCommand::USER, config.username.as_str()), token)
        .await?;
    if reply.is_intermediate() {
        control
            .execute(&Command::new(FtpCommand::PASS, config.password.as_str()), token)
            .await?;
    }
    debug!("Logged in as {}", config.username);
    Ok(())
}
