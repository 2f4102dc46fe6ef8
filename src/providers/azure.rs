use crate::config::AzureConfig;
use crate::error::PricingError;
use crate::extractors::azure::{self, RetailPriceResponse};
use crate::pricing::models::{Provider, RateTriple};
use crate::provider_trait::PricingProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Azure Retail Prices API
pub struct AzurePricing {
    config: AzureConfig,
}

impl AzurePricing {
    pub fn new(config: AzureConfig) -> Self {
        Self { config }
    }
}

/// OData filter selecting pay-as-you-go VM meters for one SKU in one region
///
/// ARM names (`Standard_D2s_v3`) are matched on `armSkuName`, display names
/// (`D2s v3`) on `skuName`.
pub fn build_filter(region: &str, sku: &str) -> String {
    let sku_field = if sku.starts_with("Standard_") { "armSkuName" } else { "skuName" };
    format!(
        "serviceName eq 'Virtual Machines' and armRegionName eq '{}' and {} eq '{}' and priceType eq 'Consumption'",
        escape_literal(region),
        sku_field,
        escape_literal(sku)
    )
}

// OData string literals escape a quote by doubling it
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[async_trait]
impl PricingProvider for AzurePricing {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    async fn fetch_rates(
        &self,
        client: &Client,
        region: &str,
        instance_type: &str,
    ) -> Result<RateTriple, PricingError> {
        if !self.config.enabled {
            return Err(PricingError::Disabled(Provider::Azure));
        }

        let request = client
            .get(&self.config.base_url)
            .query(&[("$filter", build_filter(region, instance_type))])
            .timeout(Duration::from_secs(self.config.timeout_seconds));

        let response: RetailPriceResponse = super::get_json(request).await?;

        Ok(azure::extract_rates(&response, instance_type, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_display_sku() {
        assert_eq!(
            build_filter("eastus", "D2s v3"),
            "serviceName eq 'Virtual Machines' and armRegionName eq 'eastus' and skuName eq 'D2s v3' and priceType eq 'Consumption'"
        );
    }

    #[test]
    fn test_build_filter_arm_sku() {
        let filter = build_filter("westus2", "Standard_D4s_v3");
        assert!(filter.contains("armSkuName eq 'Standard_D4s_v3'"));
        assert!(filter.contains("armRegionName eq 'westus2'"));
    }

    #[test]
    fn test_build_filter_escapes_quotes() {
        assert!(build_filter("eastus", "D2s' or '1").contains("skuName eq 'D2s'' or ''1'"));
    }
}
