mod core_cli;

use crate::core_cli::{Cli, Commands};
use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::{Builder, Env};
use log::{info, warn};
use rouilleftp::constants::{DEFAULT_CONFIG_PATH, URL_SCHEME_FTP, URL_SCHEME_FTPS};
use rouilleftp::core_tls::tls_config::TlsMode;
use rouilleftp::{CancellationToken, ClientConfig, Config, FtpClient, FtpDataType, FtpError, LengthHint};
use std::io::{SeekFrom, Write};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufReader};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let mut config = load_client_config(&args.config)?;

    if let Err(e) = run(args.command, &mut config).await {
        match e.downcast_ref::<FtpError>() {
            Some(ftp_error) => eprintln!("{} {}", "FAILED".red(), ftp_error.to_ftp_response()),
            None => eprintln!("{} {:#}", "FAILED".red(), e),
        }
        return Err(e);
    }

    Ok(())
}

/// Loads the configuration, falling back to defaults when no file is given
/// and the default location does not exist.
fn load_client_config(path: &str) -> Result<ClientConfig> {
    let config = if !path.is_empty() {
        Config::load_from_file(path)?
    } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
        Config::load_from_file(DEFAULT_CONFIG_PATH)?
    } else {
        Config::default()
    };
    Ok(config.client)
}

/// Applies the host and credentials of an `ftp://` URL to the configuration
/// and returns the remote path. Plain paths are returned unchanged.
fn apply_url(config: &mut ClientConfig, remote: &str) -> Result<String> {
    let url = match Url::parse(remote) {
        Ok(url) if url.scheme() == URL_SCHEME_FTP || url.scheme() == URL_SCHEME_FTPS => url,
        _ => return Ok(remote.to_string()),
    };

    if let Some(host) = url.host_str() {
        config.host = host.to_string();
    }
    if let Some(port) = url.port() {
        config.port = port;
    }
    if !url.username().is_empty() {
        config.username = url.username().to_string();
        config.password = url.password().unwrap_or_default().to_string();
    }
    if url.scheme() == URL_SCHEME_FTPS {
        config.tls.mode = TlsMode::Explicit;
    }
    Ok(url.path().to_string())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the current operation");
            child.cancel();
        }
    });
    token
}

async fn run(command: Commands, config: &mut ClientConfig) -> Result<()> {
    let token = cancel_on_ctrl_c();

    match command {
        Commands::Get {
            remote,
            local,
            restart,
            ascii,
        } => {
            let remote = apply_url(config, &remote)?;
            let local = match local {
                Some(local) => local,
                None => remote
                    .rsplit('/')
                    .next()
                    .filter(|name| !name.is_empty())
                    .context("Cannot derive a local file name, pass one explicitly")?
                    .to_string(),
            };
            let data_type = if ascii {
                FtpDataType::Ascii
            } else {
                config.default_data_type
            };

            let client = FtpClient::connect(config).await?;
            download(&client, config, &remote, &local, data_type, restart, &token).await?;
            client.quit().await?;
        }
        Commands::Put {
            local,
            remote,
            ascii,
        } => {
            let remote = apply_url(config, &remote)?;
            let data_type = if ascii {
                FtpDataType::Ascii
            } else {
                config.default_data_type
            };

            let client = FtpClient::connect(config).await?;
            upload(&client, config, &local, &remote, data_type, &token).await?;
            client.quit().await?;
        }
        Commands::Rename { from, to } => {
            let from = apply_url(config, &from)?;
            let client = FtpClient::connect(config).await?;
            client.rename(&from, &to, &token).await?;
            println!("{} {} -> {}", "OK".green(), from, to);
            client.quit().await?;
        }
        Commands::Size { remote } => {
            let remote = apply_url(config, &remote)?;
            let client = FtpClient::connect(config).await?;
            let size = client.file_size(&remote, &token).await?;
            println!("{}", size);
            client.quit().await?;
        }
    }

    Ok(())
}

async fn download(
    client: &FtpClient,
    config: &ClientConfig,
    remote: &str,
    local: &str,
    data_type: FtpDataType,
    restart: u64,
    token: &CancellationToken,
) -> Result<()> {
    let mut file = if restart > 0 {
        let mut file = OpenOptions::new()
            .write(true)
            .open(local)
            .await
            .with_context(|| format!("Failed to open {} for resuming", local))?;
        let have = file.metadata().await?.len();
        if have < restart {
            bail!("{} holds {} bytes, cannot resume at {}", local, have, restart);
        }
        file.set_len(restart).await?;
        file.seek(SeekFrom::Start(restart)).await?;
        file
    } else {
        File::create(local)
            .await
            .with_context(|| format!("Failed to create {}", local))?
    };

    let stream = client
        .open_read_with_length(remote, data_type, restart, LengthHint::Unknown, token)
        .await?;
    let Some(stream) = stream else {
        bail!("Can't open data connection for {}", remote);
    };
    if let Some(length) = stream.length() {
        info!("Downloading {} ({} bytes) from offset {}", remote, length, stream.position());
    }

    let mut reader = BufReader::with_capacity(config.data_buffer_size, stream);
    let copied = tokio::select! {
        _ = token.cancelled() => return Err(FtpError::Cancelled.into()),
        copied = tokio::io::copy_buf(&mut reader, &mut file) => copied?,
    };
    file.flush().await?;

    let reply = client.finish_transfer(reader.into_inner(), token).await?;
    println!("{} {} bytes -> {} ({})", "OK".green(), copied, local, reply);
    Ok(())
}

async fn upload(
    client: &FtpClient,
    config: &ClientConfig,
    local: &str,
    remote: &str,
    data_type: FtpDataType,
    token: &CancellationToken,
) -> Result<()> {
    let file = File::open(local)
        .await
        .with_context(|| format!("Failed to open {}", local))?;
    let mut reader = BufReader::with_capacity(config.data_buffer_size, file);

    let stream = client
        .open_write_with_length(remote, data_type, LengthHint::Irrelevant, token)
        .await?;
    let Some(mut stream) = stream else {
        bail!("Can't open data connection for {}", remote);
    };

    let copied = tokio::select! {
        _ = token.cancelled() => return Err(FtpError::Cancelled.into()),
        copied = tokio::io::copy_buf(&mut reader, &mut stream) => copied?,
    };

    let reply = client.finish_transfer(stream, token).await?;
    println!("{} {} bytes -> {} ({})", "OK".green(), copied, remote, reply);
    Ok(())
}
