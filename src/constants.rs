// src/constants.rs

pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rouilleftp.toml";
pub const URL_SCHEME_FTP: &str = "ftp";
pub const URL_SCHEME_FTPS: &str = "ftpes";
