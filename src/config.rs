use crate::constants::DEFAULT_FTP_PORT;
use crate::core_ftpcommand::type_::FtpDataType;
use crate::core_network::pasv::PassiveMode;
use crate::core_tls::TlsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ClientConfig {
    #[validate(length(min = 1, message = "host must not be empty"))]
    pub host: String,
    #[validate(range(min = 1, message = "port must be between 1 and 65535"))]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub passive_mode: PassiveMode,
    pub tls: TlsConfig,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    #[validate(range(min = 512, message = "data_buffer_size must be at least 512 bytes"))]
    pub data_buffer_size: usize,
    pub default_data_type: FtpDataType,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: DEFAULT_FTP_PORT,
            username: String::from("anonymous"),
            password: String::from("anonymous@"),
            passive_mode: PassiveMode::Epsv,
            tls: TlsConfig::default(),
            connect_timeout_secs: Some(15),
            read_timeout_secs: Some(30),
            data_buffer_size: 64 * 1024, // Default 64 KB
            default_data_type: FtpDataType::Binary,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        config
            .client
            .validate()
            .context("Invalid client configuration")?;
        config
            .client
            .tls
            .validate()
            .context("Invalid TLS configuration")?;
        Ok(config)
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to load configuration file: {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_tls::tls_config::TlsMode;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = Config::from_toml(
            r#"
            [client]
            host = "ftp.example.org"
            "#,
        )
        .unwrap();
        assert_eq!(config.client.host, "ftp.example.org");
        assert_eq!(config.client.port, 21);
        assert_eq!(config.client.username, "anonymous");
        assert_eq!(config.client.data_buffer_size, 64 * 1024);
        assert_eq!(config.client.passive_mode, PassiveMode::Epsv);
        assert_eq!(config.client.read_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [client]
            host = "10.1.2.3"
            port = 2121
            username = "anna"
            password = "secret"
            passive_mode = "pasv"
            default_data_type = "ascii"
            read_timeout_secs = 0

            [client.tls]
            mode = "explicit"
            accept_invalid_certs = true
            "#,
        )
        .unwrap();
        assert_eq!(config.client.port, 2121);
        assert_eq!(config.client.passive_mode, PassiveMode::Pasv);
        assert_eq!(config.client.default_data_type, FtpDataType::Ascii);
        assert_eq!(config.client.tls.mode, TlsMode::Explicit);
        assert!(config.client.tls.accept_invalid_certs);
        assert_eq!(config.client.read_timeout(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[client]\nhost = \"\"\n").is_err());
        assert!(Config::from_toml("[client]\nport = 0\n").is_err());
        assert!(Config::from_toml("[client]\ndata_buffer_size = 16\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nhost = \"files.local\"\nport = 990").unwrap();
        let config = Config::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.client.host, "files.local");
        assert_eq!(config.client.port, 990);

        assert!(Config::load_from_file("/nonexistent/rouilleftp.toml").is_err());
    }
}
