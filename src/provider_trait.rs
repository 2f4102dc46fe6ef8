use crate::error::PricingError;
use crate::pricing::models::{Provider, RateTriple};
use async_trait::async_trait;
use reqwest::Client;

/// Unified interface for fetching live rates from one provider's pricing API.
///
/// Each implementation encapsulates:
/// - URL construction and query/filter syntax
/// - Authentication (none, or an API key query parameter)
/// - Decoding the payload and handing it to the matching extractor
///
/// `region` and `instance_type` are already in the provider's own vocabulary.
/// Caching and fallback substitution live above this trait.
#[async_trait]
pub trait PricingProvider: Send + Sync + 'static {
    fn provider(&self) -> Provider;

    /// Fetch and extract a rate triple.
    ///
    /// Components the extractor could not find are already filled from its
    /// static tables; an `Err` means the provider failed as a whole.
    async fn fetch_rates(
        &self,
        client: &Client,
        region: &str,
        instance_type: &str,
    ) -> Result<RateTriple, PricingError>;
}
