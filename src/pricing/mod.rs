pub mod aggregator;
pub mod cache;
pub mod fallback;
pub mod models;

pub use aggregator::PricingAggregator;
pub use cache::{CacheEntryStatus, CacheStatus, PricingCache};
pub use models::{CacheKey, PricingSnapshot, Provider, ProviderResult, RateTriple};
