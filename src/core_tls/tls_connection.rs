// TLS client connections for the control and data channels
use crate::core_tls::error::TlsError;
use crate::core_tls::nagle::{coalescing_handle, with_coalescing_suspended};
use crate::core_tls::tls_config::TlsConfig;
use log::{debug, error};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

#[derive(Clone)]
pub struct TlsConnection {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl TlsConnection {
    pub fn new(config: &TlsConfig, host: &str) -> Result<Self, TlsError> {
        if !config.is_enabled() {
            return Err(TlsError::TlsNotConfigured);
        }
        config.validate()?;

        let client_config = config.client_config()?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TlsError::InvalidServerName(format!("{}: {}", host, e)))?;

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            server_name,
        })
    }

    /// Performs the client handshake on `stream` with send coalescing
    /// suspended for its duration.
    pub async fn connect_tls(&self, stream: TcpStream) -> Result<TlsStream<TcpStream>, TlsError> {
        let (stream, handle) = coalescing_handle(stream)
            .map_err(|e| TlsError::TlsHandshakeError(e.to_string()))?;

        let handshake = self.connector.connect(self.server_name.clone(), stream);
        let tls_stream = with_coalescing_suspended(&handle, handshake)
            .await
            .map_err(|e| {
                error!("TLS handshake with {:?} failed: {}", self.server_name, e);
                TlsError::TlsHandshakeError(e.to_string())
            })?;

        debug!("TLS session established with {:?}", self.server_name);
        Ok(tls_stream)
    }
}
