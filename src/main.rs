//! TideKV server entry point.
//!
//! Parses the command line, sets up logging and runs the accept loop until
//! Ctrl+C.

use clap::Parser;
use tidekv::{Config, Server};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let server = Server::bind(config.bind_address()).await?;
    info!(
        version = tidekv::VERSION,
        addr = %server.local_addr()?,
        "TideKV ready to accept connections"
    );

    server
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {}", e);
            }
        })
        .await;

    Ok(())
}
