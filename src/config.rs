use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Overall deadline for one provider resolution, cache lookup included
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_max_entries: Option<usize>,
    /// Resolve default pricing for every provider before accepting requests
    #[serde(default)]
    pub warm_on_startup: bool,
    /// Generic region applied when a request names none; unset means each
    /// provider's own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_instance_type: Option<String>,
}

impl PricingConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl_seconds(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            cache_max_entries: None,
            warm_on_startup: false,
            default_region: None,
            default_instance_type: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AwsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Host of the public price list bulk API
    #[serde(default = "default_aws_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_aws_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AzureConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Retail prices endpoint
    #[serde(default = "default_azure_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_azure_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcpConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cloud Billing Catalog API root
    #[serde(default = "default_gcp_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Compute Engine service id in the billing catalog
    #[serde(default = "default_gcp_service_id")]
    pub service_id: String,
    #[serde(default = "default_gcp_max_pages")]
    pub max_pages: u32,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_gcp_base_url(),
            timeout_seconds: default_provider_timeout(),
            api_key: None,
            service_id: default_gcp_service_id(),
            max_pages: default_gcp_max_pages(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

fn default_fetch_timeout_seconds() -> u64 {
    15
}

fn default_enabled() -> bool {
    true
}

fn default_provider_timeout() -> u64 {
    5
}

fn default_aws_base_url() -> String {
    "https://pricing.us-east-1.amazonaws.com".to_string()
}

fn default_azure_base_url() -> String {
    "https://prices.azure.com/api/retail/prices".to_string()
}

fn default_gcp_base_url() -> String {
    "https://cloudbilling.googleapis.com/v1".to_string()
}

fn default_gcp_service_id() -> String {
    "6F81-5844-456A".to_string()
}

fn default_gcp_max_pages() -> u32 {
    10
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

/// Load configuration: optional file, then `CLOUD_COST__*` variables, then the
/// conventional `PORT` and `GCP_API_KEY` overrides
pub fn load_config(path: &str) -> anyhow::Result<Config> {
    let port = match std::env::var("PORT") {
        Ok(value) => Some(
            value
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", value, e))?,
        ),
        Err(_) => None,
    };
    let gcp_api_key = std::env::var("GCP_API_KEY").ok().filter(|key| !key.trim().is_empty());

    let config = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("CLOUD_COST")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.port", port.map(i64::from))?
        .set_override_option("providers.gcp.api_key", gcp_api_key)?
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if !matches!(cfg.server.log_format.as_str(), "text" | "json") {
        anyhow::bail!(
            "server.log_format must be 'text' or 'json', got '{}'",
            cfg.server.log_format
        );
    }

    if cfg.pricing.cache_ttl_seconds == 0 {
        anyhow::bail!("pricing.cache_ttl_seconds must be greater than 0");
    }
    if cfg.pricing.fetch_timeout_seconds == 0 {
        anyhow::bail!("pricing.fetch_timeout_seconds must be greater than 0");
    }
    if cfg.pricing.cache_max_entries == Some(0) {
        anyhow::bail!("pricing.cache_max_entries must be greater than 0 when set");
    }

    let providers = [
        ("aws", cfg.providers.aws.base_url.as_str(), cfg.providers.aws.timeout_seconds),
        ("azure", cfg.providers.azure.base_url.as_str(), cfg.providers.azure.timeout_seconds),
        ("gcp", cfg.providers.gcp.base_url.as_str(), cfg.providers.gcp.timeout_seconds),
    ];
    for (name, base_url, timeout_seconds) in providers {
        if base_url.trim().is_empty() {
            anyhow::bail!("providers.{}.base_url cannot be empty", name);
        }
        if timeout_seconds == 0 {
            anyhow::bail!("providers.{}.timeout_seconds must be greater than 0", name);
        }
    }

    if cfg.providers.gcp.max_pages < 1 {
        anyhow::bail!("providers.gcp.max_pages must be at least 1");
    }
    if cfg.providers.gcp.service_id.trim().is_empty() {
        anyhow::bail!("providers.gcp.service_id cannot be empty");
    }

    if !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("metrics.endpoint must start with '/', got '{}'", cfg.metrics.endpoint);
    }

    Ok(())
}
