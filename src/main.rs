//! MCP Aggregator Entry Point
//!
//! Parses the command line, loads the child list, initializes logging and
//! serves the aggregated catalog on stdin/stdout until the client goes away
//! or the process is interrupted.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use mcp_aggregator::core::{Aggregator, Cli, Config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Flushes the log file on drop, so it must outlive the shutdown below
    let _log_guard = logging::init(&config.logging)?;

    info!("Starting {} v{}", config.server.name, config.server.version);

    let aggregator = Aggregator::start(config).await?;

    tokio::select! {
        result = aggregator.serve_stdio() => {
            if let Err(e) = result {
                warn!(error = %e, "Client session ended with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    aggregator.shutdown().await;
    info!("Aggregator shut down");

    Ok(())
}
