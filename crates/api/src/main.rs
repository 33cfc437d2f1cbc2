//! Vehicle Inspection Server - Main Entry Point
//!
//! Usage: `inspection-server [config.toml]`

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    info!("=== Inspection Server v{} ===", env!("CARGO_PKG_VERSION"));
    info!("VIN lookup endpoint: {}", config.lookup.base_url);

    run_server(config).await.context("Server terminated")?;

    Ok(())
}
