//! CLI argument definitions for the Silt binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendKind {
    /// sled database directory (default, durable)
    Sled,
    /// In-memory with JSON persistence when a data dir is given
    Memory,
}

/// Silt document database server
#[derive(Parser, Debug)]
#[command(name = "silt")]
#[command(about = "Silt: embedded JSON document database server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Silt server
    Serve(ServeArgs),
    /// Check health of a running Silt server
    Health(HealthArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 4100, env = "SILT_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "SILT_HOST")]
    pub host: String,

    /// Data directory for storage files
    #[arg(short = 'D', long, default_value = "data", env = "SILT_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Database name, used as the storage file or directory name
    #[arg(long, default_value = "silt", env = "SILT_DB_NAME")]
    pub db_name: String,

    /// Storage backend to use
    #[arg(short, long, default_value = "sled", env = "SILT_BACKEND")]
    pub backend: BackendKind,

    /// API key required on every request except the health check
    #[arg(long, env = "SILT_API_KEY")]
    pub api_key: Option<String>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Port of the server to check
    #[arg(short, long, default_value_t = 4100, env = "SILT_PORT")]
    pub port: u16,

    /// Host of the server to check
    #[arg(long, default_value = "127.0.0.1", env = "SILT_HOST")]
    pub host: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
