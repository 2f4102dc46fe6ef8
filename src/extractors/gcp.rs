//! Google Cloud Billing Catalog extraction
//!
//! GCP does not price machine types directly. The hourly rate is assembled from
//! the per-vCPU "Instance Core" SKU and the per-GiB "Instance Ram" SKU of the
//! machine family, weighted by the machine shape.

use crate::pricing::models::{is_valid_rate, RateTriple};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_INSTANCE_TYPE: &str = "e2-standard-2";

pub const FALLBACK_RATES: RateTriple = RateTriple::new(0.01, 0.020, 0.08);

const COMPUTE_RATES: &[(&str, f64)] = &[
    ("e2-standard-2", 0.01),
    ("e2-standard-4", 0.02),
    ("n1-standard-2", 0.0116),
    ("n1-standard-4", 0.0232),
];

/// Machine type -> (vCPUs, memory GiB)
const MACHINE_SHAPES: &[(&str, f64, f64)] = &[
    ("e2-micro", 2.0, 1.0),
    ("e2-small", 2.0, 2.0),
    ("e2-medium", 2.0, 4.0),
    ("e2-standard-2", 2.0, 8.0),
    ("e2-standard-4", 4.0, 16.0),
    ("e2-standard-8", 8.0, 32.0),
    ("e2-highmem-2", 2.0, 16.0),
    ("e2-highcpu-2", 2.0, 2.0),
    ("n1-standard-1", 1.0, 3.75),
    ("n1-standard-2", 2.0, 7.5),
    ("n1-standard-4", 4.0, 15.0),
    ("n1-standard-8", 8.0, 30.0),
    ("n2-standard-2", 2.0, 8.0),
    ("n2-standard-4", 4.0, 16.0),
    ("n2d-standard-2", 2.0, 8.0),
    ("c2-standard-4", 4.0, 16.0),
];

/// Cloud Storage standard class (USD/GB-month)
const STORAGE_RATE: f64 = 0.020;
/// Premium tier internet egress (USD/GB)
const DATA_TRANSFER_RATE: f64 = 0.08;

const EXCLUDED_DESCRIPTIONS: &[&str] = &["preemptible", "spot", "custom", "sole tenancy", "commitment"];

/// One page of `GET /v1/services/{service}/skus`
#[derive(Debug, Default, Deserialize)]
pub struct SkuPage {
    #[serde(default)]
    pub skus: Vec<Sku>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sku {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: SkuCategory,
    #[serde(default, rename = "serviceRegions")]
    pub service_regions: Vec<String>,
    #[serde(default, rename = "geoTaxonomy")]
    pub geo_taxonomy: Option<GeoTaxonomy>,
    #[serde(default, rename = "pricingInfo")]
    pub pricing_info: Vec<PricingInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuCategory {
    #[serde(default, rename = "resourceFamily")]
    pub resource_family: String,
    #[serde(default, rename = "usageType")]
    pub usage_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeoTaxonomy {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub regions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PricingInfo {
    #[serde(default, rename = "pricingExpression")]
    pub pricing_expression: PricingExpression,
}

#[derive(Debug, Default, Deserialize)]
pub struct PricingExpression {
    #[serde(default, rename = "usageUnit")]
    pub usage_unit: String,
    #[serde(default, rename = "baseUnitConversionFactor")]
    pub base_unit_conversion_factor: Option<f64>,
    #[serde(default, rename = "tieredRates")]
    pub tiered_rates: Vec<TierRate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TierRate {
    #[serde(default, rename = "startUsageAmount")]
    pub start_usage_amount: f64,
    #[serde(default, rename = "unitPrice")]
    pub unit_price: Money,
}

/// Fixed-point USD amount: `units + nanos / 1e9`
#[derive(Debug, Default, Deserialize)]
pub struct Money {
    #[serde(default, deserialize_with = "deserialize_units")]
    pub units: i64,
    #[serde(default)]
    pub nanos: i64,
}

impl Money {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nanos as f64 / 1_000_000_000.0
    }
}

// The catalog encodes int64 as a JSON string
fn deserialize_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Units {
        Text(String),
        Number(i64),
    }

    match Units::deserialize(deserializer)? {
        Units::Number(n) => Ok(n),
        Units::Text(s) if s.trim().is_empty() => Ok(0),
        Units::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Component {
    Core,
    Ram,
}

impl Component {
    fn marker(&self) -> &'static str {
        match self {
            Component::Core => "instance core",
            Component::Ram => "instance ram",
        }
    }
}

pub fn extract_rates(skus: &[Sku], machine_type: &str, region: &str) -> RateTriple {
    RateTriple {
        compute: extract_compute_rate(skus, machine_type, region),
        storage: storage_rate(region),
        data: data_transfer_rate(region),
    }
}

/// `vCPUs × core rate + memory GiB × RAM rate`, or the static table when the
/// machine type is unknown or either SKU is missing
pub fn extract_compute_rate(skus: &[Sku], machine_type: &str, region: &str) -> f64 {
    let Some((vcpus, memory_gb)) = machine_shape(machine_type) else {
        debug!(machine_type = machine_type, "Unknown GCP machine type, using static compute rate");
        return compute_fallback(machine_type);
    };
    let family = machine_family(machine_type);

    let core = find_hourly_rate(skus, &family, Component::Core, region);
    let ram = find_hourly_rate(skus, &family, Component::Ram, region);

    match (core, ram) {
        (Some(core_rate), Some(ram_rate)) => vcpus * core_rate + memory_gb * ram_rate,
        _ => {
            debug!(
                machine_type = machine_type,
                region = region,
                core_found = core.is_some(),
                ram_found = ram.is_some(),
                "GCP core/RAM SKU missing, using static compute rate"
            );
            compute_fallback(machine_type)
        }
    }
}

pub fn compute_fallback(machine_type: &str) -> f64 {
    COMPUTE_RATES
        .iter()
        .find(|(name, _)| *name == machine_type)
        .map(|(_, rate)| *rate)
        .unwrap_or(FALLBACK_RATES.compute)
}

pub fn storage_rate(_region: &str) -> f64 {
    STORAGE_RATE
}

pub fn data_transfer_rate(_region: &str) -> f64 {
    DATA_TRANSFER_RATE
}

/// (vCPUs, memory GiB) of a known machine type
pub fn machine_shape(machine_type: &str) -> Option<(f64, f64)> {
    MACHINE_SHAPES
        .iter()
        .find(|(name, _, _)| *name == machine_type)
        .map(|(_, vcpus, memory)| (*vcpus, *memory))
}

/// `e2-standard-2` -> `E2`
pub fn machine_family(machine_type: &str) -> String {
    machine_type
        .split('-')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Hourly price of a single pricing expression
///
/// Per-second units are scaled to an hour before applying the declared
/// base-unit conversion factor.
pub fn hourly_rate(expression: &PricingExpression) -> Option<f64> {
    let price = expression
        .tiered_rates
        .iter()
        .filter(|tier| tier.unit_price.to_f64() > 0.0)
        .min_by(|a, b| a.start_usage_amount.total_cmp(&b.start_usage_amount))
        .or_else(|| expression.tiered_rates.first())?
        .unit_price
        .to_f64();

    let factor = expression
        .base_unit_conversion_factor
        .filter(|factor| factor.is_finite() && *factor > 0.0)
        .unwrap_or(1.0);

    let hourly = if is_per_second(&expression.usage_unit) {
        price * 3600.0 / factor
    } else {
        price / factor
    };

    is_valid_rate(hourly).then_some(hourly)
}

fn is_per_second(unit: &str) -> bool {
    let unit = unit.trim().to_lowercase();
    unit == "s" || unit.ends_with(".s") || unit == "sec" || unit == "second" || unit == "seconds"
}

fn find_hourly_rate(skus: &[Sku], family: &str, component: Component, region: &str) -> Option<f64> {
    skus.iter()
        .filter(|sku| matches_component(sku, family, component))
        .filter(|sku| serves_region(sku, region))
        .flat_map(|sku| sku.pricing_info.iter())
        .find_map(|info| hourly_rate(&info.pricing_expression))
}

fn matches_component(sku: &Sku, family: &str, component: Component) -> bool {
    if !sku.category.resource_family.eq_ignore_ascii_case("Compute") {
        return false;
    }
    if !sku.category.usage_type.is_empty() && sku.category.usage_type != "OnDemand" {
        return false;
    }

    let description = sku.description.to_lowercase();
    let family = family.to_lowercase();

    description.starts_with(&format!("{} ", family))
        && description.contains(component.marker())
        && !EXCLUDED_DESCRIPTIONS.iter().any(|excluded| description.contains(excluded))
}

fn serves_region(sku: &Sku, region: &str) -> bool {
    let in_taxonomy = sku
        .geo_taxonomy
        .as_ref()
        .map(|geo| geo.regions.iter().any(|r| r == region) || geo.kind.eq_ignore_ascii_case("GLOBAL"))
        .unwrap_or(false);

    in_taxonomy || sku.service_regions.iter().any(|r| r == region || r == "global")
}
