//! Usage × rates arithmetic and the single-vs-mixed recommendation

use crate::pricing::models::{Provider, ProviderResult, RateTriple};
use serde::Serialize;

const STANDING_TIPS: [&str; 3] = [
    "Right-size compute (avoid overprovisioning).",
    "Reduce egress where possible; it often dominates costs.",
    "Consider reserved/committed discounts for steady workloads.",
];

/// Workload to price: compute hours, GB-months stored, GB transferred out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    pub compute_hours: f64,
    pub storage_gb: f64,
    pub data_gb: f64,
}

impl Usage {
    /// Every quantity is finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.compute_hours, self.storage_gb, self.data_gb]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Compute,
    Storage,
    Data,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Compute, Category::Storage, Category::Data];

    fn label(&self) -> &'static str {
        match self {
            Category::Compute => "Compute",
            Category::Storage => "Storage",
            Category::Data => "Data transfer",
        }
    }
}

/// Cost per category in USD, rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub compute: f64,
    pub storage: f64,
    pub data: f64,
}

impl CostBreakdown {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Compute => self.compute,
            Category::Storage => self.storage,
            Category::Data => self.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCost {
    pub provider: Provider,
    pub region: String,
    pub instance_type: String,
    pub pricing: RateTriple,
    pub breakdown: CostBreakdown,
    pub total: f64,
    pub resolved_from_cache: bool,
}

/// Cheapest provider chosen independently for each category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedPlan {
    pub compute_provider: Provider,
    pub storage_provider: Provider,
    pub data_provider: Provider,
    pub breakdown: CostBreakdown,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChosenPlan {
    Single { provider: Provider, total: f64 },
    Mixed { total: f64 },
}

impl ChosenPlan {
    pub fn kind(&self) -> &'static str {
        match self {
            ChosenPlan::Single { .. } => "single",
            ChosenPlan::Mixed { .. } => "mixed",
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            ChosenPlan::Single { total, .. } | ChosenPlan::Mixed { total } => *total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub chosen: ChosenPlan,
    pub best_single: ProviderCost,
    pub mixed: MixedPlan,
    pub savings: f64,
    pub tips: Vec<String>,
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn calculate_cost(result: &ProviderResult, usage: &Usage) -> ProviderCost {
    let rates = result.rates;
    let compute = usage.compute_hours * rates.compute;
    let storage = usage.storage_gb * rates.storage;
    let data = usage.data_gb * rates.data;

    ProviderCost {
        provider: result.provider,
        region: result.region.clone(),
        instance_type: result.instance_type.clone(),
        pricing: rates,
        breakdown: CostBreakdown {
            compute: round4(compute),
            storage: round4(storage),
            data: round4(data),
        },
        total: round4(compute + storage + data),
        resolved_from_cache: result.resolved_from_cache,
    }
}

pub fn calculate_costs<'a>(
    results: impl IntoIterator<Item = &'a ProviderResult>,
    usage: &Usage,
) -> Vec<ProviderCost> {
    results
        .into_iter()
        .map(|result| calculate_cost(result, usage))
        .collect()
}

/// `None` only when `costs` is empty
///
/// Ties go to the later entry, so callers pass costs in AWS, Azure, GCP order.
pub fn recommend(costs: &[ProviderCost]) -> Option<Recommendation> {
    let best_single = cheapest_by(costs, |cost| cost.total)?;

    let compute = cheapest_by(costs, |cost| cost.breakdown.compute)?;
    let storage = cheapest_by(costs, |cost| cost.breakdown.storage)?;
    let data = cheapest_by(costs, |cost| cost.breakdown.data)?;

    let breakdown = CostBreakdown {
        compute: compute.breakdown.compute,
        storage: storage.breakdown.storage,
        data: data.breakdown.data,
    };
    let mixed = MixedPlan {
        compute_provider: compute.provider,
        storage_provider: storage.provider,
        data_provider: data.provider,
        breakdown,
        total: round4(breakdown.compute + breakdown.storage + breakdown.data),
    };

    let chosen = if mixed.total < best_single.total {
        ChosenPlan::Mixed { total: mixed.total }
    } else {
        ChosenPlan::Single {
            provider: best_single.provider,
            total: best_single.total,
        }
    };

    let savings = round4((best_single.total - mixed.total).abs());

    let chosen_breakdown = match chosen {
        ChosenPlan::Single { .. } => best_single.breakdown,
        ChosenPlan::Mixed { .. } => mixed.breakdown,
    };
    let tips = build_tips(&chosen, &chosen_breakdown);

    Some(Recommendation {
        chosen,
        best_single: best_single.clone(),
        mixed,
        savings,
        tips,
    })
}

fn cheapest_by<F>(costs: &[ProviderCost], key: F) -> Option<&ProviderCost>
where
    F: Fn(&ProviderCost) -> f64,
{
    costs
        .iter()
        .reduce(|best, next| if key(best) < key(next) { best } else { next })
}

fn build_tips(chosen: &ChosenPlan, breakdown: &CostBreakdown) -> Vec<String> {
    let mut tips: Vec<String> = STANDING_TIPS.iter().map(|tip| tip.to_string()).collect();

    let total = chosen.total();
    if total > 0.0 {
        let dominant = Category::ALL
            .into_iter()
            .reduce(|a, b| if breakdown.get(b) > breakdown.get(a) { b } else { a })
            .unwrap_or(Category::Compute);
        let share = (breakdown.get(dominant) / total * 100.0).round();
        tips.push(format!(
            "{} is the largest share of this plan ({}%); optimize it first.",
            dominant.label(),
            share
        ));
    }

    if matches!(chosen, ChosenPlan::Mixed { .. }) {
        tips.push(
            "A mixed plan spans several providers; budget for cross-provider transfer and operational overhead."
                .to_string(),
        );
    }

    tips
}
