use crate::config::AwsConfig;
use crate::error::PricingError;
use crate::extractors::aws::{self, OfferFile};
use crate::pricing::models::{Provider, RateTriple};
use crate::provider_trait::PricingProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// AWS price list bulk API (EC2 regional offer + S3 offer)
pub struct AwsPricing {
    config: AwsConfig,
}

impl AwsPricing {
    pub fn new(config: AwsConfig) -> Self {
        Self { config }
    }

    fn ec2_url(&self, region: &str) -> String {
        format!(
            "{}/offers/v1.0/aws/AmazonEC2/current/{}/index.json",
            self.config.base_url.trim_end_matches('/'),
            region
        )
    }

    fn s3_url(&self) -> String {
        format!(
            "{}/offers/v1.0/aws/AmazonS3/current/index.json",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn fetch_offer(&self, client: &Client, url: String) -> Result<OfferFile, PricingError> {
        let request = client
            .get(&url)
            .timeout(Duration::from_secs(self.config.timeout_seconds));
        super::get_json(request).await
    }
}

#[async_trait]
impl PricingProvider for AwsPricing {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    async fn fetch_rates(
        &self,
        client: &Client,
        region: &str,
        instance_type: &str,
    ) -> Result<RateTriple, PricingError> {
        if !self.config.enabled {
            return Err(PricingError::Disabled(Provider::Aws));
        }

        let (ec2, s3) = tokio::join!(
            self.fetch_offer(client, self.ec2_url(region)),
            self.fetch_offer(client, self.s3_url()),
        );
        let ec2 = ec2?;

        // Storage has a regional table to fall back on; only compute is required
        let s3 = s3.unwrap_or_else(|e| {
            warn!(region = region, error = %e, "S3 offer unavailable, using regional storage rate");
            OfferFile::default()
        });

        Ok(aws::extract_rates(&ec2, &s3, instance_type, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_urls() {
        let provider = AwsPricing::new(AwsConfig {
            base_url: "https://pricing.example.com/".to_string(),
            ..AwsConfig::default()
        });

        assert_eq!(
            provider.ec2_url("eu-west-1"),
            "https://pricing.example.com/offers/v1.0/aws/AmazonEC2/current/eu-west-1/index.json"
        );
        assert_eq!(
            provider.s3_url(),
            "https://pricing.example.com/offers/v1.0/aws/AmazonS3/current/index.json"
        );
    }

    #[tokio::test]
    async fn test_disabled_provider_fails_without_request() {
        let provider = AwsPricing::new(AwsConfig {
            enabled: false,
            base_url: "http://127.0.0.1:9".to_string(),
            ..AwsConfig::default()
        });

        let result = provider.fetch_rates(&Client::new(), "us-east-1", "m5.large").await;
        assert!(matches!(result, Err(PricingError::Disabled(Provider::Aws))));
    }
}
