pub mod comparison;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pricing;
pub mod provider_trait;
pub mod providers;
pub mod server;
pub mod signals;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging with the default level
///
/// Note: This function can only be called once.
pub fn init_tracing() {
    init_tracing_with("info", "text");
}

/// Initialize tracing with a configured level and format (`text` or `json`)
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_tracing_with(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
