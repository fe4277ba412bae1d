//! docket server binary.
//!
//! Serves the docket HTTP API over an in-memory store, optionally persisted
//! to a snapshot file between runs.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use docket_api::{Server, ServerConfig, CONFIG_FILE_NAME};
use tracing::info;

/// docket server - versioned document store over HTTP.
#[derive(Parser, Debug)]
#[command(name = "docket-server")]
#[command(about = "HTTP API server for the docket document store")]
struct Args {
    /// Config file (created with defaults if missing).
    #[arg(long, default_value = CONFIG_FILE_NAME, env = "DOCKET_CONFIG")]
    config: PathBuf,

    /// Address to bind, overrides the config file.
    #[arg(long, env = "DOCKET_HOST")]
    host: Option<String>,

    /// Port to bind, overrides the config file.
    #[arg(long, env = "DOCKET_PORT")]
    port: Option<u16>,

    /// Snapshot file, overrides the config file.
    #[arg(long, env = "DOCKET_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info", env = "DOCKET_LOG_LEVEL")]
    log_level: String,
}

impl Args {
    fn load_config(&self) -> Result<ServerConfig> {
        ServerConfig::write_default_if_missing(&self.config)?;
        let mut config = ServerConfig::from_file(&self.config)?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = Some(snapshot.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = args.load_config()?;
    info!(
        config = %args.config.display(),
        addr = %config.socket_addr(),
        snapshot = ?config.snapshot_path,
        "Starting docket server"
    );

    Server::open(config)?.run().await
}
