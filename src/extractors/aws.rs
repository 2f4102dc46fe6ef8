//! AWS price list extraction
//!
//! Works on the public bulk offer files (`AmazonEC2` regional index and the
//! `AmazonS3` index). Both share the same `products` / `terms` layout.

use crate::pricing::models::{is_valid_rate, RateTriple};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_INSTANCE_TYPE: &str = "m5.large";

pub const FALLBACK_RATES: RateTriple = RateTriple::new(0.0116, 0.023, 0.09);

/// Static on-demand compute estimates (USD/hour)
const COMPUTE_RATES: &[(&str, f64)] = &[
    ("m5.large", 0.0116),
    ("m5.xlarge", 0.0232),
    ("c5.large", 0.0108),
    ("r5.large", 0.0136),
];

/// S3 Standard storage (USD/GB-month)
const STORAGE_RATES: &[(&str, f64)] = &[
    ("us-east-1", 0.023),
    ("us-west-2", 0.023),
    ("eu-west-1", 0.023),
    ("ap-southeast-1", 0.025),
];

/// Data transfer out to the internet (USD/GB)
const DATA_TRANSFER_RATES: &[(&str, f64)] = &[
    ("us-east-1", 0.09),
    ("us-west-2", 0.09),
    ("eu-west-1", 0.09),
    ("ap-southeast-1", 0.114),
];

/// Region code to the `location` attribute used by the price list
const REGION_LOCATIONS: &[(&str, &str)] = &[
    ("us-east-1", "US East (N. Virginia)"),
    ("us-east-2", "US East (Ohio)"),
    ("us-west-1", "US West (N. California)"),
    ("us-west-2", "US West (Oregon)"),
    ("ca-central-1", "Canada (Central)"),
    ("eu-west-1", "EU (Ireland)"),
    ("eu-west-2", "EU (London)"),
    ("eu-central-1", "EU (Frankfurt)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("sa-east-1", "South America (Sao Paulo)"),
];

/// Bulk offer file (`index.json`)
#[derive(Debug, Default, Deserialize)]
pub struct OfferFile {
    #[serde(default)]
    pub products: HashMap<String, OfferProduct>,
    #[serde(default)]
    pub terms: OfferTerms,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferProduct {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferTerms {
    /// SKU -> offer term code -> term
    #[serde(default, rename = "OnDemand")]
    pub on_demand: HashMap<String, HashMap<String, OfferTerm>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferTerm {
    #[serde(default, rename = "priceDimensions")]
    pub price_dimensions: HashMap<String, PriceDimension>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceDimension {
    #[serde(default)]
    pub unit: String,
    #[serde(default, rename = "beginRange")]
    pub begin_range: Option<String>,
    #[serde(default, rename = "pricePerUnit")]
    pub price_per_unit: HashMap<String, String>,
}

/// Price list `location` for a region code; unknown codes pass through unchanged
pub fn region_to_location(region: &str) -> &str {
    lookup(REGION_LOCATIONS, region).unwrap_or(region)
}

/// Build the rate triple from the EC2 and S3 offers
pub fn extract_rates(ec2: &OfferFile, s3: &OfferFile, instance_type: &str, region: &str) -> RateTriple {
    RateTriple {
        compute: extract_compute_rate(ec2, instance_type, region),
        storage: extract_storage_rate(s3, region),
        data: data_transfer_rate(region),
    }
}

/// On-demand Linux shared-tenancy hourly price for `instance_type`
pub fn extract_compute_rate(offer: &OfferFile, instance_type: &str, region: &str) -> f64 {
    let location = region_to_location(region);
    let required = [
        ("instanceType", instance_type),
        ("tenancy", "Shared"),
        ("operatingSystem", "Linux"),
        ("preInstalledSw", "NA"),
        ("capacitystatus", "Used"),
        ("location", location),
    ];

    let sku = offer
        .products
        .iter()
        .filter(|(_, product)| {
            required
                .iter()
                .all(|(name, expected)| attribute(product, name) == Some(*expected))
        })
        .map(|(sku, _)| sku)
        .min();

    let price = sku.and_then(|sku| on_demand_usd_price(offer, sku, |unit| unit.eq_ignore_ascii_case("Hrs")));

    match price {
        Some(price) => price,
        None => {
            debug!(
                instance_type = instance_type,
                location = location,
                "No matching EC2 SKU, using static compute rate"
            );
            compute_fallback(instance_type)
        }
    }
}

/// S3 Standard first-tier storage price, or the regional table
pub fn extract_storage_rate(offer: &OfferFile, region: &str) -> f64 {
    let location = region_to_location(region);

    let sku = offer
        .products
        .iter()
        .filter(|(_, product)| {
            attribute(product, "storageClass") == Some("General Purpose")
                && attribute(product, "volumeType") == Some("Standard")
                && attribute(product, "location") == Some(location)
        })
        .map(|(sku, _)| sku)
        .min();

    sku.and_then(|sku| on_demand_usd_price(offer, sku, |unit| unit.eq_ignore_ascii_case("GB-Mo")))
        .unwrap_or_else(|| storage_fallback(region))
}

/// Static compute estimate for an instance type
pub fn compute_fallback(instance_type: &str) -> f64 {
    lookup(COMPUTE_RATES, instance_type).unwrap_or(FALLBACK_RATES.compute)
}

pub fn storage_fallback(region: &str) -> f64 {
    lookup(STORAGE_RATES, region).unwrap_or(FALLBACK_RATES.storage)
}

pub fn data_transfer_rate(region: &str) -> f64 {
    lookup(DATA_TRANSFER_RATES, region).unwrap_or(FALLBACK_RATES.data)
}

fn attribute<'a>(product: &'a OfferProduct, name: &str) -> Option<&'a str> {
    product
        .attributes
        .get(name)
        .or_else(|| {
            // Older offer files spell some attribute names in camelCase
            product
                .attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

/// USD price of the first-tier on-demand dimension whose unit matches
fn on_demand_usd_price(offer: &OfferFile, sku: &str, unit_matches: impl Fn(&str) -> bool) -> Option<f64> {
    let terms = offer.terms.on_demand.get(sku)?;

    let mut dimensions: Vec<&PriceDimension> = terms
        .values()
        .flat_map(|term| term.price_dimensions.values())
        .filter(|dimension| unit_matches(&dimension.unit))
        .collect();
    // First tier first
    dimensions.sort_by_key(|dimension| {
        dimension
            .begin_range
            .as_deref()
            .and_then(|begin| begin.parse::<f64>().ok())
            .map(|begin| begin as u64)
            .unwrap_or(0)
    });

    dimensions
        .into_iter()
        .filter_map(|dimension| dimension.price_per_unit.get("USD"))
        .filter_map(|price| price.trim().parse::<f64>().ok())
        .find(|price| is_valid_rate(*price))
}

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ec2_offer() -> OfferFile {
        serde_json::from_value(json!({
            "offerCode": "AmazonEC2",
            "products": {
                "SKU_LINUX": {
                    "sku": "SKU_LINUX",
                    "productFamily": "Compute Instance",
                    "attributes": {
                        "instanceType": "m5.large",
                        "tenancy": "Shared",
                        "operatingSystem": "Linux",
                        "preInstalledSw": "NA",
                        "capacitystatus": "Used",
                        "location": "US East (N. Virginia)"
                    }
                },
                "SKU_WINDOWS": {
                    "sku": "SKU_WINDOWS",
                    "productFamily": "Compute Instance",
                    "attributes": {
                        "instanceType": "m5.large",
                        "tenancy": "Shared",
                        "operatingSystem": "Windows",
                        "preInstalledSw": "NA",
                        "capacitystatus": "Used",
                        "location": "US East (N. Virginia)"
                    }
                }
            },
            "terms": {
                "OnDemand": {
                    "SKU_LINUX": {
                        "SKU_LINUX.JRTCKXETXF": {
                            "priceDimensions": {
                                "SKU_LINUX.JRTCKXETXF.6YS6EN2CT7": {
                                    "unit": "Hrs",
                                    "pricePerUnit": { "USD": "0.0960000000" }
                                }
                            }
                        }
                    },
                    "SKU_WINDOWS": {
                        "SKU_WINDOWS.JRTCKXETXF": {
                            "priceDimensions": {
                                "SKU_WINDOWS.JRTCKXETXF.6YS6EN2CT7": {
                                    "unit": "Hrs",
                                    "pricePerUnit": { "USD": "0.1880000000" }
                                }
                            }
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn s3_offer() -> OfferFile {
        serde_json::from_value(json!({
            "offerCode": "AmazonS3",
            "products": {
                "S3_STD": {
                    "sku": "S3_STD",
                    "productFamily": "Storage",
                    "attributes": {
                        "storageClass": "General Purpose",
                        "volumeType": "Standard",
                        "location": "EU (Ireland)"
                    }
                }
            },
            "terms": {
                "OnDemand": {
                    "S3_STD": {
                        "S3_STD.JRTCKXETXF": {
                            "priceDimensions": {
                                "S3_STD.T2": { "unit": "GB-Mo", "beginRange": "51200", "pricePerUnit": { "USD": "0.0220000000" } },
                                "S3_STD.T1": { "unit": "GB-Mo", "beginRange": "0", "pricePerUnit": { "USD": "0.0230000000" } }
                            }
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_compute_rate_matches_linux_sku() {
        let rate = extract_compute_rate(&ec2_offer(), "m5.large", "us-east-1");
        assert!((rate - 0.096).abs() < 1e-9);
    }

    #[test]
    fn test_extract_compute_rate_falls_back_for_unknown_instance() {
        let offer = ec2_offer();
        assert_eq!(extract_compute_rate(&offer, "c5.large", "us-east-1"), 0.0108);
        assert_eq!(extract_compute_rate(&offer, "x9.huge", "us-east-1"), 0.0116);
    }

    #[test]
    fn test_extract_compute_rate_requires_matching_location() {
        // Same instance type priced in Virginia only
        assert_eq!(extract_compute_rate(&ec2_offer(), "m5.large", "eu-west-1"), 0.0116);
    }

    #[test]
    fn test_unknown_region_passes_through_as_location() {
        assert_eq!(region_to_location("us-east-1"), "US East (N. Virginia)");
        assert_eq!(region_to_location("mars-north-1"), "mars-north-1");
    }

    #[test]
    fn test_extract_storage_rate_prefers_first_tier() {
        let rate = extract_storage_rate(&s3_offer(), "eu-west-1");
        assert!((rate - 0.023).abs() < 1e-9);
    }

    #[test]
    fn test_extract_storage_rate_uses_region_table() {
        assert_eq!(extract_storage_rate(&OfferFile::default(), "ap-southeast-1"), 0.025);
        assert_eq!(extract_storage_rate(&OfferFile::default(), "sa-east-1"), 0.023);
    }

    #[test]
    fn test_data_transfer_rate_by_region() {
        assert_eq!(data_transfer_rate("ap-southeast-1"), 0.114);
        assert_eq!(data_transfer_rate("us-east-1"), 0.09);
        assert_eq!(data_transfer_rate("unknown"), 0.09);
    }

    #[test]
    fn test_empty_offers_yield_fallback_triple() {
        let empty = OfferFile::default();
        let rates = extract_rates(&empty, &empty, "m5.large", "us-east-1");
        assert_eq!(rates, FALLBACK_RATES);
    }
}
