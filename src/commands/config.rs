use anyhow::Result;
use cloud_cost_gateway::config::{self, Config};
use colored::Colorize;
use tracing::info;

/// Execute the config show command
///
/// Displays the current configuration with secrets masked
pub fn show(config_path: &str) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(config_path)?;
    let sanitized = sanitize_secrets(&cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&sanitized)?;
    println!("{}", toml_string);

    info!("Configuration displayed successfully");
    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &str) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Enabled Providers: {}", count_enabled_providers(&cfg));
    println!(
        "  GCP API Key: {}",
        if cfg.providers.gcp.api_key.is_some() { "configured" } else { "missing" }
    );
    println!("  Cache TTL: {}s", cfg.pricing.cache_ttl_seconds);

    info!("Configuration validation successful");
    Ok(())
}

/// Mask secrets in configuration for safe display
fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    if let Some(key) = sanitized.providers.gcp.api_key.as_mut() {
        *key = mask_api_key(key);
    }
    sanitized
}

/// Mask an API key for safe display
///
/// Shows first 7 and last 4 characters with asterisks in between
/// Example: "AIzaSyA1234567890abcd" -> "AIzaSyA...abcd"
fn mask_api_key(key: &str) -> String {
    if key.len() <= 11 || !key.is_ascii() {
        return "***".to_string();
    }

    let prefix = &key[..7];
    let suffix = &key[key.len() - 4..];

    format!("{}...{}", prefix, suffix)
}

fn count_enabled_providers(cfg: &Config) -> usize {
    [
        cfg.providers.aws.enabled,
        cfg.providers.azure.enabled,
        cfg.providers.gcp.enabled,
    ]
    .iter()
    .filter(|enabled| **enabled)
    .count()
}
