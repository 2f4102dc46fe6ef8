use crate::extractors::{aws, azure, gcp};
use crate::pricing::models::{Provider, RateTriple};

/// Static rates substituted when a provider cannot be resolved live
///
/// Same values as the defaults of each extractor's own tables.
pub fn for_provider(provider: Provider) -> RateTriple {
    match provider {
        Provider::Aws => aws::FALLBACK_RATES,
        Provider::Azure => azure::FALLBACK_RATES,
        Provider::Gcp => gcp::FALLBACK_RATES,
    }
}
