//! Stagehand host entry point.

use std::error::Error;
use std::sync::Arc;

use stagehand_host::app::HostApplication;
use stagehand_host::config::HostConfig;
use stagehand_host::sound::TracingSoundService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Stagehand host");

    // Read configuration from environment.
    let config = HostConfig::from_env().map_err(|e| format!("invalid configuration: {e}"))?;
    let catalog = config.catalog()?;
    tracing::info!(
        rooms = catalog.len(),
        frame_rate = config.frame_rate,
        realtime = config.realtime,
        "configuration loaded"
    );

    // Build the host.
    let sound = Arc::new(TracingSoundService::new());
    let mut app = HostApplication::new(config, Arc::new(catalog), sound)?;

    // Run the curtain and the room tour.
    let summary = app.run().await;
    let report = serde_json::to_string(&summary)?;
    tracing::info!(summary = %report, "Stagehand host finished");

    Ok(())
}
