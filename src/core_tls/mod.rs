// TLS support for the control and data connections

pub mod error;
pub mod nagle;
pub mod tls_config;
pub mod tls_connection;

pub use error::TlsError;
pub use nagle::{Coalescing, LatencyTuner};
pub use tls_config::TlsConfig;
pub use tls_connection::TlsConnection;
