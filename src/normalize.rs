//! Caller input -> provider vocabulary
//!
//! Callers describe a workload with one generic `(region, instanceType)` pair.
//! Each provider names regions and machine types differently, so the pair is
//! remapped per provider before it reaches a client or the cache.

use crate::extractors::{aws, azure, gcp};
use crate::pricing::models::Provider;
use regex::Regex;
use std::sync::LazyLock;

static AWS_REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(us|eu|ap|sa|ca|me|af)-[a-z]+-\d+$").unwrap());
static AZURE_REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+[a-z0-9]*$").unwrap());
static GCP_REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+-[a-z]+\d+$").unwrap());
static AZURE_INSTANCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]\d").unwrap());

/// Equivalent regions as (AWS, Azure, GCP)
const REGION_EQUIVALENTS: &[(&str, &str, &str)] = &[
    ("us-east-1", "eastus", "us-east1"),
    ("us-east-2", "centralus", "us-central1"),
    ("us-west-2", "westus2", "us-west1"),
    ("eu-west-1", "northeurope", "europe-west1"),
    ("eu-central-1", "germanywestcentral", "europe-west3"),
    ("ap-southeast-1", "southeastasia", "asia-southeast1"),
    ("ap-northeast-1", "japaneast", "asia-northeast1"),
];

/// Region and instance type in one provider's vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub region: String,
    pub instance_type: String,
}

/// Which provider's naming scheme an instance string follows
///
/// Checked in order: a `.` means AWS (`m5.large`), then a `-` means GCP
/// (`e2-standard-2`), then a letter followed by a digit means Azure (`D2s v3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceShape {
    Aws,
    Gcp,
    Azure,
    Unrecognized,
}

impl InstanceShape {
    pub fn classify(instance_type: &str) -> Self {
        if instance_type.contains('.') {
            InstanceShape::Aws
        } else if instance_type.contains('-') {
            InstanceShape::Gcp
        } else if AZURE_INSTANCE.is_match(instance_type) {
            InstanceShape::Azure
        } else {
            InstanceShape::Unrecognized
        }
    }

    fn belongs_to(&self, provider: Provider) -> bool {
        matches!(
            (self, provider),
            (InstanceShape::Aws, Provider::Aws)
                | (InstanceShape::Azure, Provider::Azure)
                | (InstanceShape::Gcp, Provider::Gcp)
        )
    }
}

pub fn default_region(provider: Provider) -> &'static str {
    match provider {
        Provider::Aws => aws::DEFAULT_REGION,
        Provider::Azure => azure::DEFAULT_REGION,
        Provider::Gcp => gcp::DEFAULT_REGION,
    }
}

pub fn default_instance_type(provider: Provider) -> &'static str {
    match provider {
        Provider::Aws => aws::DEFAULT_INSTANCE_TYPE,
        Provider::Azure => azure::DEFAULT_INSTANCE_TYPE,
        Provider::Gcp => gcp::DEFAULT_INSTANCE_TYPE,
    }
}

pub fn normalize(provider: Provider, region: Option<&str>, instance_type: Option<&str>) -> NormalizedInput {
    NormalizedInput {
        region: normalize_region(provider, region),
        instance_type: normalize_instance_type(provider, instance_type),
    }
}

pub fn normalize_region(provider: Provider, region: Option<&str>) -> String {
    let region = match region.map(str::trim).filter(|r| !r.is_empty()) {
        Some(region) => region.to_lowercase(),
        None => return default_region(provider).to_string(),
    };

    if region_shape(&region) == Some(provider) {
        return region;
    }

    translate_region(&region, provider)
        .unwrap_or_else(|| default_region(provider))
        .to_string()
}

pub fn normalize_instance_type(provider: Provider, instance_type: Option<&str>) -> String {
    match instance_type.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instance) if InstanceShape::classify(instance).belongs_to(provider) => instance.to_string(),
        _ => default_instance_type(provider).to_string(),
    }
}

/// Provider whose region naming `region` follows
fn region_shape(region: &str) -> Option<Provider> {
    if AWS_REGION.is_match(region) {
        Some(Provider::Aws)
    } else if GCP_REGION.is_match(region) {
        Some(Provider::Gcp)
    } else if AZURE_REGION.is_match(region) {
        Some(Provider::Azure)
    } else {
        None
    }
}

fn translate_region(region: &str, target: Provider) -> Option<&'static str> {
    REGION_EQUIVALENTS
        .iter()
        .find(|(aws, azure, gcp)| *aws == region || *azure == region || *gcp == region)
        .map(|(aws, azure, gcp)| match target {
            Provider::Aws => *aws,
            Provider::Azure => *azure,
            Provider::Gcp => *gcp,
        })
}
