use crate::config::GcpConfig;
use crate::error::PricingError;
use crate::extractors::gcp::{self, Sku, SkuPage};
use crate::logging::redact_url;
use crate::pricing::models::{Provider, RateTriple};
use crate::provider_trait::PricingProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Cloud Billing Catalog API (Compute Engine SKUs)
pub struct GcpPricing {
    config: GcpConfig,
}

impl GcpPricing {
    pub fn new(config: GcpConfig) -> Self {
        Self { config }
    }

    fn skus_url(&self) -> String {
        format!(
            "{}/services/{}/skus",
            self.config.base_url.trim_end_matches('/'),
            self.config.service_id
        )
    }

    /// Follow `nextPageToken` until exhausted or `max_pages` pages were read
    async fn fetch_skus(&self, client: &Client, api_key: &str) -> Result<Vec<Sku>, PricingError> {
        let url = self.skus_url();
        let mut skus = Vec::new();
        let mut page_token: Option<String> = None;

        for page_number in 1..=self.config.max_pages {
            let mut request = client
                .get(&url)
                .query(&[("key", api_key)])
                .timeout(Duration::from_secs(self.config.timeout_seconds));
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            if let Some(built) = request.try_clone().and_then(|r| r.build().ok()) {
                debug!(url = %redact_url(built.url().as_str()), "Requesting GCP SKU page");
            }

            // reqwest errors carry the request URL, which includes the key
            let page: SkuPage = super::get_json(request).await.map_err(|e| match e {
                PricingError::Http(e) => PricingError::Http(e.without_url()),
                other => other,
            })?;
            debug!(page = page_number, skus = page.skus.len(), "Fetched GCP SKU page");
            skus.extend(page.skus);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(skus)
    }
}

#[async_trait]
impl PricingProvider for GcpPricing {
    fn provider(&self) -> Provider {
        Provider::Gcp
    }

    async fn fetch_rates(
        &self,
        client: &Client,
        region: &str,
        instance_type: &str,
    ) -> Result<RateTriple, PricingError> {
        if !self.config.enabled {
            return Err(PricingError::Disabled(Provider::Gcp));
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PricingError::MissingCredential("GCP API key is not configured".to_string()))?;

        let skus = self.fetch_skus(client, api_key).await?;

        Ok(gcp::extract_rates(&skus, instance_type, region))
    }
}
