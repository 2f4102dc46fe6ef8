use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
///
/// Fails if a global recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "pricing_cache_lookups_total",
        "Pricing cache lookups by outcome (hit, miss, bypass)"
    );
    describe_gauge!(
        "pricing_cache_entries",
        "Number of entries in the pricing cache"
    );
    describe_counter!(
        "pricing_upstream_fetches_total",
        "Upstream pricing fetches by provider and outcome"
    );
    describe_histogram!(
        "pricing_upstream_fetch_duration_seconds",
        "Upstream pricing fetch duration in seconds"
    );
    describe_counter!(
        "pricing_fallbacks_total",
        "Providers resolved to static fallback rates"
    );
    describe_counter!(
        "cost_comparisons_total",
        "Cost comparisons by chosen plan type"
    );
    describe_gauge!(
        "cloud_cost_gateway_info",
        "Gateway version and build information"
    );

    gauge!("cloud_cost_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a cache lookup; `outcome` is `hit`, `miss` or `bypass`
pub fn record_cache_lookup(provider: &str, outcome: &str) {
    counter!(
        "pricing_cache_lookups_total",
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);
}

pub fn set_cache_entries(count: usize) {
    gauge!("pricing_cache_entries").set(count as f64);
}

/// Record an upstream fetch; `outcome` is `success` or an error kind
pub fn record_upstream_fetch(provider: &str, outcome: &str) {
    counter!(
        "pricing_upstream_fetches_total",
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);
}

pub fn record_fetch_duration(provider: &str, duration: Duration) {
    histogram!(
        "pricing_upstream_fetch_duration_seconds",
        "provider" => provider.to_string(),
    )
    .record(duration.as_secs_f64());
}

pub fn record_fallback(provider: &str, reason: &str) {
    counter!(
        "pricing_fallbacks_total",
        "provider" => provider.to_string(),
        "reason" => reason.to_string(),
    )
    .increment(1);
}

/// Record a comparison; `chosen` is `single` or `mixed`
pub fn record_comparison(chosen: &str) {
    counter!("cost_comparisons_total", "chosen" => chosen.to_string()).increment(1);
}
