use anyhow::Result;
use cloud_cost_gateway::{config, init_tracing_with, server};
use colored::Colorize;
use tracing::info;

/// Execute the start command
///
/// Loads configuration, initializes tracing from it and runs the server
/// until SIGTERM/SIGINT.
pub async fn execute(config_path: &str) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    init_tracing_with(&cfg.server.log_level, &cfg.server.log_format);
    println!("{}", "Starting cloud cost gateway...".green());
    info!(config = config_path, "Configuration loaded");

    // Blocks until shutdown
    server::start_server(cfg).await?;

    Ok(())
}
