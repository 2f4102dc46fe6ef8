pub mod aws;
pub mod azure;
pub mod gcp;

pub use aws::AwsPricing;
pub use azure::AzurePricing;
pub use gcp::GcpPricing;

use crate::config::ProvidersConfig;
use crate::error::PricingError;
use crate::normalize;
use crate::pricing::cache::PricingCache;
use crate::pricing::fallback;
use crate::pricing::models::{CacheKey, Provider, ProviderResult};
use crate::provider_trait::PricingProvider;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Send a request and decode a JSON body, mapping every failure to a `PricingError`
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PricingError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let mut message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
            message.truncate(cut);
        }
        return Err(PricingError::UpstreamStatus { status, message });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| PricingError::MalformedPayload(e.to_string()))
}

/// One implementation per provider, built from configuration
pub fn build_providers(config: &ProvidersConfig) -> [Arc<dyn PricingProvider>; 3] {
    [
        Arc::new(AwsPricing::new(config.aws.clone())),
        Arc::new(AzurePricing::new(config.azure.clone())),
        Arc::new(GcpPricing::new(config.gcp.clone())),
    ]
}

/// Cache-aware client for one provider
///
/// Normalizes the caller's input, serves fresh cache entries, and otherwise
/// fetches, repairs invalid components from the static fallback and stores
/// the result.
#[derive(Clone)]
pub struct ProviderClient {
    inner: Arc<dyn PricingProvider>,
    cache: Arc<PricingCache>,
    http: Client,
}

impl ProviderClient {
    pub fn new(inner: Arc<dyn PricingProvider>, cache: Arc<PricingCache>, http: Client) -> Self {
        Self { inner, cache, http }
    }

    pub fn provider(&self) -> Provider {
        self.inner.provider()
    }

    pub async fn fetch(
        &self,
        region: Option<&str>,
        instance_type: Option<&str>,
        force_fresh: bool,
    ) -> Result<ProviderResult, PricingError> {
        let provider = self.provider();
        let input = normalize::normalize(provider, region, instance_type);
        let key = CacheKey::new(provider, input.region.clone(), input.instance_type.clone());

        if force_fresh {
            crate::metrics::record_cache_lookup(provider.as_str(), "bypass");
        } else if let Some(rates) = self.cache.get(&key) {
            crate::metrics::record_cache_lookup(provider.as_str(), "hit");
            debug!(key = %key, "Pricing cache hit");
            return Ok(ProviderResult {
                provider,
                region: input.region,
                instance_type: input.instance_type,
                rates,
                resolved_from_cache: true,
            });
        } else {
            crate::metrics::record_cache_lookup(provider.as_str(), "miss");
        }

        let start = Instant::now();
        let fetched = self
            .inner
            .fetch_rates(&self.http, &input.region, &input.instance_type)
            .await;
        crate::metrics::record_fetch_duration(provider.as_str(), start.elapsed());

        let rates = match fetched {
            Ok(rates) => {
                crate::metrics::record_upstream_fetch(provider.as_str(), "success");
                rates.or_fallback(fallback::for_provider(provider))
            }
            Err(e) => {
                crate::metrics::record_upstream_fetch(provider.as_str(), e.kind());
                return Err(e);
            }
        };

        debug!(
            key = %key,
            compute = rates.compute,
            storage = rates.storage,
            data = rates.data,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched live pricing"
        );
        self.cache.put(key, rates);

        Ok(ProviderResult {
            provider,
            region: input.region,
            instance_type: input.instance_type,
            rates,
            resolved_from_cache: false,
        })
    }
}
