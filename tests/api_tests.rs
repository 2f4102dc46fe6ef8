//! HTTP surface tests driven through the router with `oneshot`

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cloud_cost_gateway::config::Config;
use cloud_cost_gateway::handlers::AppState;
use cloud_cost_gateway::pricing::PricingAggregator;
use cloud_cost_gateway::server::{build_cache, create_router};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Every upstream refuses connections, so all pricing resolves to fallback rates
fn offline_config() -> Config {
    let mut cfg = Config::default();
    cfg.providers.aws.base_url = "http://127.0.0.1:9".to_string();
    cfg.providers.azure.base_url = "http://127.0.0.1:9/prices".to_string();
    cfg.providers.gcp.base_url = "http://127.0.0.1:9/v1".to_string();
    cfg.providers.aws.timeout_seconds = 2;
    cfg.providers.azure.timeout_seconds = 2;
    cfg.pricing.fetch_timeout_seconds = 3;
    cfg
}

fn app(cfg: &Config) -> Router {
    let cache = Arc::new(build_cache(&cfg.pricing));
    let aggregator = PricingAggregator::from_config(cfg, cache).unwrap();
    create_router(AppState::new(Arc::new(aggregator)), None, "/metrics")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("not a number: {value}"));
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

#[tokio::test]
async fn test_health() {
    let app = app(&offline_config());
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_compare_with_fallback_pricing() {
    let app = app(&offline_config());
    let (status, body) = send(
        &app,
        post_json("/compare", json!({ "computeHours": 10, "storageGB": 50, "dataGB": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["provider"], "AWS");
    assert_close(&results[0]["total"], 2.166);
    assert_eq!(results[1]["provider"], "Azure");
    assert_close(&results[1]["total"], 2.17);
    assert_eq!(results[2]["provider"], "GCP");
    assert_close(&results[2]["total"], 1.9);
    assert_close(&results[2]["breakdown"]["storage"], 1.0);
    assert_eq!(results[2]["resolvedFromCache"], false);

    let recommendation = &body["recommendation"];
    assert_eq!(recommendation["chosen"]["type"], "single");
    assert_eq!(recommendation["chosen"]["provider"], "GCP");
    assert_close(&recommendation["mixed"]["total"], 1.9);
    assert_eq!(recommendation["mixed"]["computeProvider"], "GCP");
    assert_close(&recommendation["savings"], 0.0);
    assert!(recommendation["tips"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_compare_reports_normalized_inputs() {
    let app = app(&offline_config());
    let (status, body) = send(
        &app,
        post_json(
            "/compare",
            json!({ "computeHours": 1, "storageGB": 1, "dataGB": 1, "region": "us-east-1", "instanceSize": "m5.large" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["region"], "us-east-1");
    assert_eq!(results[0]["instanceType"], "m5.large");
    assert_eq!(results[1]["region"], "eastus");
    assert_eq!(results[1]["instanceType"], "D2s v3");
    assert_eq!(results[2]["region"], "us-east1");
    assert_eq!(results[2]["instanceType"], "e2-standard-2");
}

#[tokio::test]
async fn test_compare_with_provider_filter() {
    let app = app(&offline_config());
    let (status, body) = send(
        &app,
        post_json(
            "/compare",
            json!({ "provider": "azure", "computeHours": 10, "storageGB": 50, "dataGB": 10 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["recommendation"]["chosen"]["provider"], "Azure");
}

#[tokio::test]
async fn test_compare_zero_usage() {
    let app = app(&offline_config());
    let (status, body) = send(
        &app,
        post_json("/compare", json!({ "computeHours": 0, "storageGB": 0, "dataGB": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_close(&body["recommendation"]["chosen"]["total"], 0.0);
    assert_close(&body["recommendation"]["savings"], 0.0);
}

#[tokio::test]
async fn test_compare_missing_usage_never_reaches_upstreams() {
    let server = MockServer::start_async().await;
    let mut upstreams = Vec::new();
    for path in [
        "/offers/v1.0/aws/AmazonEC2/current/us-east-1/index.json",
        "/offers/v1.0/aws/AmazonS3/current/index.json",
        "/prices",
        "/v1/services/6F81-5844-456A/skus",
    ] {
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(json!({}));
            })
            .await;
        upstreams.push(mock);
    }

    let mut cfg = offline_config();
    cfg.providers.aws.base_url = server.base_url();
    cfg.providers.azure.base_url = server.url("/prices");
    cfg.providers.gcp.base_url = server.url("/v1");
    cfg.providers.gcp.api_key = Some("test-key".to_string());
    let app = app(&cfg);

    let (status, body) = send(&app, post_json("/compare", json!({ "computeHours": 10, "dataGB": 10 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Please provide computeHours, storageGB, and dataGB" }));
    for mock in &upstreams {
        mock.assert_hits_async(0).await;
    }

    let (_, body) = send(&app, get("/pricing/cache")).await;
    assert_eq!(body["cache"]["size"], 0);
}

#[tokio::test]
async fn test_compare_without_json_body_is_missing_usage() {
    let app = app(&offline_config());
    let request = Request::builder().method("POST").uri("/compare").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide computeHours, storageGB, and dataGB");
}

#[tokio::test]
async fn test_compare_empty_json_body_is_missing_usage() {
    let app = app(&offline_config());
    let request = Request::builder()
        .method("POST")
        .uri("/compare")
        .header("content-type", "application/json")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide computeHours, storageGB, and dataGB");
}

#[tokio::test]
async fn test_compare_negative_usage_is_bad_request() {
    let app = app(&offline_config());
    let (status, body) = send(
        &app,
        post_json("/compare", json!({ "computeHours": -1, "storageGB": 50, "dataGB": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("non-negative"));
}

#[tokio::test]
async fn test_compare_unknown_provider_is_bad_request() {
    let app = app(&offline_config());
    let (status, _) = send(
        &app,
        post_json(
            "/compare",
            json!({ "provider": "oracle", "computeHours": 1, "storageGB": 1, "dataGB": 1 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compare_rejects_malformed_body() {
    let app = app(&offline_config());
    let request = Request::builder()
        .method("POST")
        .uri("/compare")
        .header("content-type", "application/json")
        .body(Body::from("{ computeHours: "))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_provider_pricing() {
    let app = app(&offline_config());
    let (status, body) = send(&app, get("/pricing/aws?region=eu-west-1&instanceType=t3.micro")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "AWS");
    assert_eq!(body["region"], "eu-west-1");
    assert_eq!(body["instanceType"], "t3.micro");
    assert_close(&body["pricing"]["compute"], 0.0116);
    assert_eq!(body["resolvedFromCache"], false);
}

#[tokio::test]
async fn test_provider_pricing_unknown_provider() {
    let app = app(&offline_config());
    let (status, body) = send(&app, get("/pricing/oracle")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("oracle"));
}

#[tokio::test]
async fn test_cache_status_starts_empty() {
    let app = app(&offline_config());
    let (status, body) = send(&app, get("/pricing/cache")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"]["size"], 0);
    assert_eq!(body["cache"]["entries"], json!([]));
}

#[tokio::test]
async fn test_live_pricing_populates_and_clears_cache() {
    let server = MockServer::start_async().await;
    let azure = server
        .mock_async(|when, then| {
            when.method(GET).path("/prices");
            then.status(200).json_body(json!({
                "Items": [{ "unitPrice": 0.096, "skuName": "D2s v3", "productName": "Virtual Machines DSv3 Series" }]
            }));
        })
        .await;
    let mut cfg = offline_config();
    cfg.providers.azure.base_url = server.url("/prices");
    let app = app(&cfg);

    let (status, body) = send(&app, get("/pricing/azure")).await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&body["pricing"]["compute"], 0.096);
    assert_eq!(body["resolvedFromCache"], false);

    let (_, body) = send(&app, get("/pricing/azure")).await;
    assert_eq!(body["resolvedFromCache"], true);
    azure.assert_hits_async(1).await;

    let (_, body) = send(&app, get("/pricing/cache")).await;
    assert_eq!(body["cache"]["size"], 1);
    assert_eq!(body["cache"]["entries"][0]["key"], "azure-eastus-D2s v3");

    let (status, body) = send(&app, post_json("/pricing/cache/clear", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pricing cache cleared");

    let (_, body) = send(&app, get("/pricing/cache")).await;
    assert_eq!(body["cache"]["size"], 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app(&offline_config());
    let (status, _) = send(&app, get("/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
