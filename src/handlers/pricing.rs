use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::error::AppError;
use crate::pricing::models::{Provider, RateTriple};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuery {
    pub region: Option<String>,
    pub instance_type: Option<String>,
    #[serde(default)]
    pub fresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPricingResponse {
    pub provider: Provider,
    pub region: String,
    pub instance_type: String,
    pub pricing: RateTriple,
    pub resolved_from_cache: bool,
}

/// Handle GET /pricing/:provider
pub async fn provider_pricing(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<ProviderPricingResponse>, AppError> {
    let provider: Provider = provider
        .parse()
        .map_err(|e: crate::pricing::models::UnknownProvider| AppError::bad_request(e.to_string()))?;

    let result = state
        .aggregator
        .resolve(
            provider,
            query.region.as_deref(),
            query.instance_type.as_deref(),
            query.fresh,
        )
        .await;

    Ok(Json(ProviderPricingResponse {
        provider: result.provider,
        region: result.region,
        instance_type: result.instance_type,
        pricing: result.rates,
        resolved_from_cache: result.resolved_from_cache,
    }))
}

/// Handle GET /pricing/cache
pub async fn cache_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "cache": state.cache.status(),
    }))
}

/// Handle POST /pricing/cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.cache.len();
    state.cache.clear();
    info!(removed = removed, "Pricing cache cleared");

    Json(json!({
        "status": "ok",
        "message": "Pricing cache cleared",
    }))
}
