use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::{Config, PricingConfig},
    handlers::{self, AppState},
    logging::SensitiveApiKey,
    metrics,
    pricing::{PricingAggregator, PricingCache},
    signals::setup_signal_handlers,
};

/// Start the cost comparison server
///
/// This function:
/// 1. Initializes metrics
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Builds the pricing cache and aggregator, optionally warming the cache
/// 4. Binds to the configured address
/// 5. Serves requests with graceful shutdown support
pub async fn start_server(config: Config) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let (shutdown_tx, signal_handle) = setup_signal_handlers()?;
    let mut shutdown_rx = shutdown_tx.subscribe();

    let cache = Arc::new(build_cache(&config.pricing));
    let aggregator = Arc::new(PricingAggregator::from_config(&config, cache)?);
    log_provider_summary(&config);

    if config.pricing.warm_on_startup {
        info!("Warming pricing cache...");
        aggregator.warm().await;
    }

    let app = create_router(AppState::new(aggregator), metrics_handle, &config.metrics.endpoint);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting cloud cost gateway on {}", addr);
    info!(
        "Configuration: cache TTL {}s, fetch timeout {}s, metrics {}",
        config.pricing.cache_ttl_seconds,
        config.pricing.fetch_timeout_seconds,
        if config.metrics.enabled { "enabled" } else { "disabled" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

pub fn build_cache(config: &PricingConfig) -> PricingCache {
    let cache = PricingCache::new(config.cache_ttl());
    match config.cache_max_entries {
        Some(max) => cache.with_max_entries(max),
        None => cache,
    }
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    state: AppState,
    metrics_handle: Option<Arc<PrometheusHandle>>,
    metrics_endpoint: &str,
) -> Router {
    let api_routes = Router::new()
        .route("/compare", post(handlers::compare::handle_compare))
        .route("/pricing/cache", get(handlers::pricing::cache_status))
        .route("/pricing/cache/clear", post(handlers::pricing::clear_cache))
        .route("/pricing/:provider", get(handlers::pricing::provider_pricing))
        .with_state(state);

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(api_routes);

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route(metrics_endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    app.layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn log_provider_summary(config: &Config) {
    let providers = &config.providers;
    info!(
        aws = providers.aws.enabled,
        azure = providers.azure.enabled,
        gcp = providers.gcp.enabled,
        "Pricing providers"
    );

    match providers.gcp.api_key.as_deref() {
        Some(key) if providers.gcp.enabled => {
            info!(api_key = %SensitiveApiKey::new(key), "GCP billing API key configured");
        }
        None if providers.gcp.enabled => {
            warn!("GCP API key not configured; GCP pricing will use fallback rates");
        }
        _ => {}
    }
}
