use crate::config::Config;
use crate::error::PricingError;
use crate::normalize;
use crate::pricing::cache::PricingCache;
use crate::pricing::fallback;
use crate::pricing::models::{PricingSnapshot, Provider, ProviderResult};
use crate::provider_trait::PricingProvider;
use crate::providers::{self, ProviderClient};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Resolves rates for all providers; never fails
///
/// Each provider resolution is bounded by `fetch_timeout`. A provider that
/// errors or times out is answered from its static fallback rates, which are
/// not written to the cache so the next call retries upstream.
pub struct PricingAggregator {
    aws: ProviderClient,
    azure: ProviderClient,
    gcp: ProviderClient,
    cache: Arc<PricingCache>,
    fetch_timeout: Duration,
    default_region: Option<String>,
    default_instance_type: Option<String>,
}

impl PricingAggregator {
    /// Build from providers given in AWS, Azure, GCP order
    pub fn new(
        providers: [Arc<dyn PricingProvider>; 3],
        cache: Arc<PricingCache>,
        http: Client,
        fetch_timeout: Duration,
    ) -> Self {
        let [aws, azure, gcp] = providers;
        debug_assert_eq!(aws.provider(), Provider::Aws);
        debug_assert_eq!(azure.provider(), Provider::Azure);
        debug_assert_eq!(gcp.provider(), Provider::Gcp);

        Self {
            aws: ProviderClient::new(aws, cache.clone(), http.clone()),
            azure: ProviderClient::new(azure, cache.clone(), http.clone()),
            gcp: ProviderClient::new(gcp, cache.clone(), http),
            cache,
            fetch_timeout,
            default_region: None,
            default_instance_type: None,
        }
    }

    pub fn from_config(config: &Config, cache: Arc<PricingCache>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("cloud-cost-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(
            providers::build_providers(&config.providers),
            cache,
            http,
            config.pricing.fetch_timeout(),
        )
        .with_defaults(
            config.pricing.default_region.clone(),
            config.pricing.default_instance_type.clone(),
        ))
    }

    /// Generic region/instance type used when a caller supplies none
    pub fn with_defaults(mut self, region: Option<String>, instance_type: Option<String>) -> Self {
        self.default_region = region;
        self.default_instance_type = instance_type;
        self
    }

    pub fn cache(&self) -> &Arc<PricingCache> {
        &self.cache
    }

    pub fn client(&self, provider: Provider) -> &ProviderClient {
        match provider {
            Provider::Aws => &self.aws,
            Provider::Azure => &self.azure,
            Provider::Gcp => &self.gcp,
        }
    }

    /// Rates for one provider, live, cached or fallback
    pub async fn resolve(
        &self,
        provider: Provider,
        region: Option<&str>,
        instance_type: Option<&str>,
        force_fresh: bool,
    ) -> ProviderResult {
        let region = region.or(self.default_region.as_deref());
        let instance_type = instance_type.or(self.default_instance_type.as_deref());

        let fetch = self.client(provider).fetch(region, instance_type, force_fresh);
        let error = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(result)) => return result,
            Ok(Err(e)) => e,
            Err(_) => PricingError::Timeout(self.fetch_timeout),
        };

        warn!(
            provider = provider.as_str(),
            reason = error.kind(),
            error = %error,
            "Pricing unavailable, using fallback rates"
        );
        crate::metrics::record_fallback(provider.as_str(), error.kind());

        let input = normalize::normalize(provider, region, instance_type);
        ProviderResult {
            provider,
            region: input.region,
            instance_type: input.instance_type,
            rates: fallback::for_provider(provider),
            resolved_from_cache: false,
        }
    }

    /// Rates for every provider, resolved concurrently
    pub async fn get_all_pricing(
        &self,
        region: Option<&str>,
        instance_type: Option<&str>,
        force_fresh: bool,
    ) -> PricingSnapshot {
        let (aws, azure, gcp) = tokio::join!(
            self.resolve(Provider::Aws, region, instance_type, force_fresh),
            self.resolve(Provider::Azure, region, instance_type, force_fresh),
            self.resolve(Provider::Gcp, region, instance_type, force_fresh),
        );

        PricingSnapshot { aws, azure, gcp }
    }

    /// Resolve default pricing once so the first request is served from cache
    pub async fn warm(&self) {
        let snapshot = self.get_all_pricing(None, None, false).await;
        let cached = self.cache.len();
        info!(
            cached_entries = cached,
            aws_compute = snapshot.aws.rates.compute,
            azure_compute = snapshot.azure.rates.compute,
            gcp_compute = snapshot.gcp.rates.compute,
            "Pricing cache warmed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::RateTriple;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Rates(RateTriple),
        Fail,
        Hang,
    }

    struct FakeProvider {
        provider: Provider,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PricingProvider for FakeProvider {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn fetch_rates(&self, _: &Client, _: &str, _: &str) -> Result<RateTriple, PricingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Rates(rates) => Ok(*rates),
                Behavior::Fail => Err(PricingError::MalformedPayload("bad json".to_string())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(RateTriple::new(9.0, 9.0, 9.0))
                }
            }
        }
    }

    fn fake(provider: Provider, behavior: Behavior, calls: &Arc<AtomicUsize>) -> Arc<dyn PricingProvider> {
        Arc::new(FakeProvider {
            provider,
            behavior,
            calls: calls.clone(),
        })
    }

    fn aggregator(behaviors: [Behavior; 3], calls: &Arc<AtomicUsize>) -> PricingAggregator {
        let [aws, azure, gcp] = behaviors;
        PricingAggregator::new(
            [
                fake(Provider::Aws, aws, calls),
                fake(Provider::Azure, azure, calls),
                fake(Provider::Gcp, gcp, calls),
            ],
            Arc::new(PricingCache::default()),
            Client::new(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_all_failures_resolve_to_fallbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = aggregator([Behavior::Fail, Behavior::Fail, Behavior::Fail], &calls);

        let snapshot = aggregator.get_all_pricing(None, None, false).await;

        for provider in Provider::ALL {
            assert_eq!(snapshot.rates(provider), fallback::for_provider(provider));
            assert!(!snapshot.get(provider).resolved_from_cache);
        }
        // Fallbacks are never cached
        assert!(aggregator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let live = RateTriple::new(0.096, 0.023, 0.09);
        let aggregator = aggregator(
            [Behavior::Rates(live), Behavior::Rates(live), Behavior::Rates(live)],
            &calls,
        );

        let first = aggregator.resolve(Provider::Aws, Some("us-east-1"), Some("m5.large"), false).await;
        let second = aggregator.resolve(Provider::Aws, Some("us-east-1"), Some("m5.large"), false).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!first.resolved_from_cache);
        assert!(second.resolved_from_cache);
        assert_eq!(second.rates, live);
    }

    #[tokio::test]
    async fn test_force_fresh_bypasses_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let live = RateTriple::new(0.2, 0.02, 0.08);
        let aggregator = aggregator(
            [Behavior::Rates(live), Behavior::Rates(live), Behavior::Rates(live)],
            &calls,
        );

        aggregator.resolve(Provider::Gcp, None, None, false).await;
        let fresh = aggregator.resolve(Provider::Gcp, None, None, true).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!fresh.resolved_from_cache);
        assert_eq!(aggregator.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_resolves_to_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let live = RateTriple::new(0.2, 0.02, 0.08);
        let aggregator = aggregator([Behavior::Hang, Behavior::Rates(live), Behavior::Rates(live)], &calls);

        let snapshot = aggregator.get_all_pricing(None, None, false).await;

        assert_eq!(snapshot.aws.rates, fallback::for_provider(Provider::Aws));
        assert_eq!(snapshot.azure.rates, live);
        assert_eq!(snapshot.gcp.rates, live);
    }

    #[tokio::test]
    async fn test_invalid_components_are_repaired() {
        let calls = Arc::new(AtomicUsize::new(0));
        let partial = RateTriple::new(f64::NAN, 0.03, -1.0);
        let aggregator = aggregator(
            [Behavior::Rates(partial), Behavior::Fail, Behavior::Fail],
            &calls,
        );

        let result = aggregator.resolve(Provider::Aws, None, None, false).await;
        assert_eq!(result.rates, RateTriple::new(0.0116, 0.03, 0.09));
    }

    #[tokio::test]
    async fn test_results_carry_provider_specific_inputs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = aggregator([Behavior::Fail, Behavior::Fail, Behavior::Fail], &calls);

        let snapshot = aggregator.get_all_pricing(Some("us-east-1"), Some("m5.large"), false).await;

        assert_eq!(snapshot.aws.instance_type, "m5.large");
        assert_eq!(snapshot.azure.region, "eastus");
        assert_eq!(snapshot.azure.instance_type, "D2s v3");
        assert_eq!(snapshot.gcp.region, "us-east1");
        assert_eq!(snapshot.gcp.instance_type, "e2-standard-2");
    }

    #[tokio::test]
    async fn test_configured_defaults_apply_when_input_missing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = aggregator([Behavior::Fail, Behavior::Fail, Behavior::Fail], &calls)
            .with_defaults(Some("eu-west-1".to_string()), None);

        let result = aggregator.resolve(Provider::Azure, None, None, false).await;
        assert_eq!(result.region, "northeurope");
    }
}
