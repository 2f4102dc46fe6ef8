use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::comparison::{self, ProviderCost, Recommendation, Usage};
use crate::error::AppError;
use crate::pricing::models::{Provider, ProviderResult};

const MISSING_USAGE: &str = "Please provide computeHours, storageGB, and dataGB";
const INVALID_USAGE: &str = "computeHours, storageGB, and dataGB must be non-negative numbers";
const UNKNOWN_PROVIDER: &str = "Unknown provider filter";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    /// Restrict the comparison to one provider
    pub provider: Option<String>,
    pub region: Option<String>,
    pub instance_size: Option<String>,
    pub compute_hours: Option<f64>,
    #[serde(rename = "storageGB")]
    pub storage_gb: Option<f64>,
    #[serde(rename = "dataGB")]
    pub data_gb: Option<f64>,
    /// Skip the pricing cache
    pub fresh: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub results: Vec<ProviderCost>,
    pub recommendation: Recommendation,
}

/// Checked request: usage present and sane, provider filter recognized
#[derive(Debug, PartialEq)]
pub struct ValidatedCompare {
    pub usage: Usage,
    pub provider: Option<Provider>,
}

impl CompareRequest {
    pub fn validate(&self) -> Result<ValidatedCompare, AppError> {
        let (Some(compute_hours), Some(storage_gb), Some(data_gb)) =
            (self.compute_hours, self.storage_gb, self.data_gb)
        else {
            return Err(AppError::bad_request(MISSING_USAGE));
        };

        let usage = Usage {
            compute_hours,
            storage_gb,
            data_gb,
        };
        if !usage.is_valid() {
            return Err(AppError::bad_request(INVALID_USAGE));
        }

        let provider = match self.provider.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                name.parse::<Provider>()
                    .map_err(|_| AppError::bad_request(UNKNOWN_PROVIDER))?,
            ),
        };

        Ok(ValidatedCompare { usage, provider })
    }
}

/// Decode a /compare body
///
/// A body that is not declared as JSON, or is empty, decodes to an empty
/// request so it is rejected with the missing-usage message.
pub fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<CompareRequest, AppError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with("application/json"));

    if !is_json || body.trim_ascii().is_empty() {
        return Ok(CompareRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("Invalid JSON body: {}", e)))
}

/// Handle POST /compare
pub async fn handle_compare(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompareResponse>, AppError> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("compare", request_id = %request_id);

    async move {
        let request = parse_body(&headers, &body)?;
        let ValidatedCompare { usage, provider } = request.validate()?;
        let region = request.region.as_deref();
        let instance_type = request.instance_size.as_deref();
        let fresh = request.fresh.unwrap_or(false);

        let results: Vec<ProviderResult> = match provider {
            Some(provider) => vec![
                state
                    .aggregator
                    .resolve(provider, region, instance_type, fresh)
                    .await,
            ],
            None => state
                .aggregator
                .get_all_pricing(region, instance_type, fresh)
                .await
                .iter()
                .cloned()
                .collect(),
        };

        let costs = comparison::calculate_costs(&results, &usage);
        let recommendation = comparison::recommend(&costs).ok_or_else(|| AppError::Internal {
            message: "Failed to compare costs".to_string(),
            details: "no provider pricing was resolved".to_string(),
        })?;

        crate::metrics::record_comparison(recommendation.chosen.kind());
        info!(
            providers = costs.len(),
            chosen = recommendation.chosen.kind(),
            total = recommendation.chosen.total(),
            savings = recommendation.savings,
            "Comparison complete"
        );

        Ok(Json(CompareResponse {
            results: costs,
            recommendation,
        }))
    }
    .instrument(span)
    .await
}
