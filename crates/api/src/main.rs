//! Telemetry Dashboard - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load()?;
    init_logging(&config)?;

    info!("=== Telemetry Dashboard v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Serving readings from {}", config.table);

    run_server(config).await
}
