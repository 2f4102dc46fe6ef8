//! Azure Retail Prices API extraction

use crate::pricing::models::{is_valid_rate, RateTriple};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_REGION: &str = "eastus";
pub const DEFAULT_INSTANCE_TYPE: &str = "D2s v3";

pub const FALLBACK_RATES: RateTriple = RateTriple::new(0.012, 0.024, 0.085);

const COMPUTE_RATES: &[(&str, f64)] = &[
    ("D2s v3", 0.012),
    ("D4s v3", 0.024),
    ("B2s", 0.0104),
    ("F2s v2", 0.0108),
    ("E2s v3", 0.0151),
];

/// Blob storage, hot tier (USD/GB-month)
const STORAGE_RATE: f64 = 0.024;
/// Internet egress (USD/GB)
const DATA_TRANSFER_RATE: f64 = 0.085;

/// Response of `GET https://prices.azure.com/api/retail/prices`
#[derive(Debug, Default, Deserialize)]
pub struct RetailPriceResponse {
    #[serde(default, rename = "Items", alias = "value")]
    pub items: Vec<RetailPriceItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetailPriceItem {
    #[serde(default, rename = "unitPrice")]
    pub unit_price: f64,
    #[serde(default, rename = "skuName")]
    pub sku_name: String,
    #[serde(default, rename = "productName")]
    pub product_name: String,
}

impl RetailPriceItem {
    /// Spot, low-priority and Windows meters price a different product
    fn is_standard_linux(&self) -> bool {
        let sku = self.sku_name.to_lowercase();
        !sku.contains("spot") && !sku.contains("low priority") && !self.product_name.contains("Windows")
    }
}

pub fn extract_rates(response: &RetailPriceResponse, sku: &str, region: &str) -> RateTriple {
    RateTriple {
        compute: extract_compute_rate(response, sku),
        storage: storage_rate(region),
        data: data_transfer_rate(region),
    }
}

/// Unit price of the first usable item, taken directly as the hourly rate
pub fn extract_compute_rate(response: &RetailPriceResponse, sku: &str) -> f64 {
    let price = response
        .items
        .iter()
        .filter(|item| item.is_standard_linux())
        .map(|item| item.unit_price)
        .find(|price| is_valid_rate(*price));

    match price {
        Some(price) => price,
        None => {
            debug!(sku = sku, items = response.items.len(), "No usable Azure price item, using static compute rate");
            compute_fallback(sku)
        }
    }
}

pub fn compute_fallback(sku: &str) -> f64 {
    let sku = display_sku(sku);
    COMPUTE_RATES
        .iter()
        .find(|(name, _)| *name == sku)
        .map(|(_, rate)| *rate)
        .unwrap_or(FALLBACK_RATES.compute)
}

pub fn storage_rate(_region: &str) -> f64 {
    STORAGE_RATE
}

pub fn data_transfer_rate(_region: &str) -> f64 {
    DATA_TRANSFER_RATE
}

/// `Standard_D2s_v3` -> `D2s v3`; other names are returned unchanged
pub fn display_sku(sku: &str) -> String {
    match sku.strip_prefix("Standard_") {
        Some(rest) => rest.replace('_', " "),
        None => sku.to_string(),
    }
}
