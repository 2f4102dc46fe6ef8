use anyhow::{bail, Result};
use cloud_cost_gateway::comparison::{self, ChosenPlan, Usage};
use cloud_cost_gateway::config;
use cloud_cost_gateway::pricing::{CacheKey, PricingAggregator, Provider, ProviderResult};
use cloud_cost_gateway::server::build_cache;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::QuoteArgs;

/// Execute the quote command
///
/// Resolves pricing once (live, or fallback when a provider is unavailable)
/// and prints the rates. With all three usage figures, also prints the
/// cost comparison.
pub async fn execute(config_path: &str, args: QuoteArgs) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let usage = usage_from_args(&args)?;
    let provider = match args.provider.as_deref() {
        Some(name) => Some(name.parse::<Provider>()?),
        None => None,
    };

    let cache = Arc::new(build_cache(&cfg.pricing));
    let aggregator = PricingAggregator::from_config(&cfg, cache)?;

    let region = args.region.as_deref();
    let instance_type = args.instance_type.as_deref();
    let results: Vec<ProviderResult> = match provider {
        Some(provider) => vec![aggregator.resolve(provider, region, instance_type, args.fresh).await],
        None => aggregator
            .get_all_pricing(region, instance_type, args.fresh)
            .await
            .iter()
            .cloned()
            .collect(),
    };

    println!("{}", "Rates:".bold());
    for result in &results {
        let source = if aggregator.cache().get(&cache_key(result)).is_some() {
            "live".green()
        } else {
            "fallback".yellow()
        };
        println!(
            "  {:<6} {:<16} {:<14} compute ${:.4}/h  storage ${:.4}/GB-mo  data ${:.4}/GB  [{}]",
            result.provider.to_string().cyan(),
            result.region,
            result.instance_type,
            result.rates.compute,
            result.rates.storage,
            result.rates.data,
            source
        );
    }

    let Some(usage) = usage else {
        return Ok(());
    };

    let costs = comparison::calculate_costs(&results, &usage);
    let Some(recommendation) = comparison::recommend(&costs) else {
        bail!("No pricing resolved");
    };

    println!();
    println!("{}", "Costs:".bold());
    for cost in &costs {
        println!(
            "  {:<6} compute ${:.4}  storage ${:.4}  data ${:.4}  total ${:.4}",
            cost.provider.to_string().cyan(),
            cost.breakdown.compute,
            cost.breakdown.storage,
            cost.breakdown.data,
            cost.total
        );
    }

    println!();
    let mixed = &recommendation.mixed;
    println!(
        "  Mixed: compute {} / storage {} / data {}  total ${:.4}",
        mixed.compute_provider, mixed.storage_provider, mixed.data_provider, mixed.total
    );
    let chosen = match &recommendation.chosen {
        ChosenPlan::Single { provider, total } => format!("{} only (${:.4})", provider, total),
        ChosenPlan::Mixed { total } => format!("mixed (${:.4})", total),
    };
    println!("  {}: {}", "Recommended".green().bold(), chosen);
    println!("  Savings vs alternative: ${:.4}", recommendation.savings);

    println!();
    println!("{}", "Tips:".bold());
    for tip in &recommendation.tips {
        println!("  - {}", tip);
    }

    Ok(())
}

// Live results are cached, fallbacks never are
fn cache_key(result: &ProviderResult) -> CacheKey {
    CacheKey::new(result.provider, result.region.clone(), result.instance_type.clone())
}

/// All three usage figures, none, or an error for a partial set
fn usage_from_args(args: &QuoteArgs) -> Result<Option<Usage>> {
    let usage = match (args.compute_hours, args.storage_gb, args.data_gb) {
        (None, None, None) => return Ok(None),
        (Some(compute_hours), Some(storage_gb), Some(data_gb)) => Usage {
            compute_hours,
            storage_gb,
            data_gb,
        },
        _ => bail!("Please provide --compute-hours, --storage-gb and --data-gb together"),
    };

    if !usage.is_valid() {
        bail!("Usage figures must be non-negative numbers");
    }
    Ok(Some(usage))
}
