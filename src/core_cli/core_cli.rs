use clap::{Parser, Subcommand};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "rouilleftp", about = "A FTP/FTPS client written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a remote file
    Get {
        /// Remote path or ftp:// URL
        remote: String,
        /// Local destination, defaults to the remote file name
        local: Option<String>,
        /// Resume from this byte offset
        #[arg(long, default_value_t = 0)]
        restart: u64,
        /// Transfer in ASCII mode
        #[arg(long)]
        ascii: bool,
    },
    /// Upload a local file
    Put {
        local: String,
        /// Remote path or ftp:// URL
        remote: String,
        /// Transfer in ASCII mode
        #[arg(long)]
        ascii: bool,
    },
    /// Rename a remote file or directory
    Rename {
        /// Remote path or ftp:// URL
        from: String,
        to: String,
    },
    /// Print the size of a remote file
    Size {
        /// Remote path or ftp:// URL
        remote: String,
    },
}
