use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported cloud providers
///
/// Closed set: every provider has exactly one extractor, one client and one
/// fallback triple. Iteration order (AWS, Azure, GCP) is the presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    /// Lowercase identifier used in routes, cache keys and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    /// Name shown to users and used in JSON payloads
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Gcp => "GCP",
        }
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Returned when a string does not name a known provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Normalized unit prices for one provider
///
/// - `compute`: USD per instance-hour
/// - `storage`: USD per GB-month
/// - `data`: USD per GB transferred out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTriple {
    pub compute: f64,
    pub storage: f64,
    pub data: f64,
}

impl RateTriple {
    pub const fn new(compute: f64, storage: f64, data: f64) -> Self {
        Self {
            compute,
            storage,
            data,
        }
    }

    /// All three components are finite and non-negative
    pub fn is_valid(&self) -> bool {
        is_valid_rate(self.compute) && is_valid_rate(self.storage) && is_valid_rate(self.data)
    }

    /// Replace every invalid component with the matching component of `fallback`
    pub fn or_fallback(self, fallback: RateTriple) -> RateTriple {
        RateTriple {
            compute: if is_valid_rate(self.compute) { self.compute } else { fallback.compute },
            storage: if is_valid_rate(self.storage) { self.storage } else { fallback.storage },
            data: if is_valid_rate(self.data) { self.data } else { fallback.data },
        }
    }
}

pub(crate) fn is_valid_rate(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Cache identity of a resolved rate triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: Provider,
    pub region: String,
    pub instance_type: String,
}

impl CacheKey {
    pub fn new(provider: Provider, region: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            provider,
            region: region.into(),
            instance_type: instance_type.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.provider.as_str(), self.region, self.instance_type)
    }
}

/// Pricing resolved for one provider during a single aggregator call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    pub provider: Provider,
    /// Provider-specific region that was priced
    pub region: String,
    /// Provider-specific instance type that was priced
    pub instance_type: String,
    pub rates: RateTriple,
    pub resolved_from_cache: bool,
}

/// Rates for all three providers
///
/// One field per provider, so a snapshot can never be partial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSnapshot {
    #[serde(rename = "AWS")]
    pub aws: ProviderResult,
    #[serde(rename = "Azure")]
    pub azure: ProviderResult,
    #[serde(rename = "GCP")]
    pub gcp: ProviderResult,
}

impl PricingSnapshot {
    pub fn get(&self, provider: Provider) -> &ProviderResult {
        match provider {
            Provider::Aws => &self.aws,
            Provider::Azure => &self.azure,
            Provider::Gcp => &self.gcp,
        }
    }

    pub fn rates(&self, provider: Provider) -> RateTriple {
        self.get(provider).rates
    }

    /// Results in presentation order (AWS, Azure, GCP)
    pub fn iter(&self) -> impl Iterator<Item = &ProviderResult> {
        [&self.aws, &self.azure, &self.gcp].into_iter()
    }
}
