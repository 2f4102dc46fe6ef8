pub mod compare;
pub mod health;
pub mod metrics_handler;
pub mod pricing;

use crate::pricing::{PricingAggregator, PricingCache};
use std::sync::Arc;

/// Shared state for the pricing and comparison routes
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<PricingAggregator>,
    pub cache: Arc<PricingCache>,
}

impl AppState {
    pub fn new(aggregator: Arc<PricingAggregator>) -> Self {
        let cache = aggregator.cache().clone();
        Self { aggregator, cache }
    }
}
