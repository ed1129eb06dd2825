//! End-to-end tests for the assembled service.
//!
//! Builds the application the way the binary does: configuration drives
//! the transport and the classifier, the registry is wired with the
//! default destinations and requests go through the full router.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ferry_api::{create_router_with_timeout, AppState, Config};
use ferry_delivery::{
    processor::BlueshiftProcessor, DestinationRegistry, HttpTransport, OutcomeClassifier,
};
use ferry_testing::{http::BLUESHIFT_CREATE_LIST, InputEventBuilder, MockDestination};
use serde_json::{json, Value};
use tower::ServiceExt;

const PROXY_RESPONSE: &str = "/v0/destinations/bqstream/proxy-response";

fn app_from_config(config: &Config, blueshift_url: Option<String>) -> Router {
    let transport = Arc::new(HttpTransport::new(&config.to_transport_config()).unwrap());
    let classifier = OutcomeClassifier::new(config.to_retryable_statuses().unwrap());
    let mut registry = DestinationRegistry::with_defaults(transport.clone(), classifier);
    if let Some(url) = blueshift_url {
        let blueshift = BlueshiftProcessor::new(transport).with_base_url(url);
        registry.register_processor(Arc::new(blueshift));
    }
    create_router_with_timeout(AppState::new(registry), config.request_timeout())
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn configured_retryable_statuses_reach_response_classification() {
    let proxy = json!({
        "responseBody": {"error": {"status": "INVALID_ARGUMENT", "message": "bad row"}},
        "status": 400,
        "payload": {}
    });

    let default_app = app_from_config(&Config::default(), None);
    let (status, body) = post(default_app, PROXY_RESPONSE, proxy.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statTags"]["meta"], json!("abortable"));

    let config = Config { retryable_statuses: "400,500-599".to_string(), ..Config::default() };
    let (status, body) = post(app_from_config(&config, None), PROXY_RESPONSE, proxy).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statTags"]["meta"], json!("retryable"));
}

#[tokio::test]
async fn mixed_batch_keeps_positions_and_isolates_failures() {
    let mock = MockDestination::start().await;
    mock.respond_json(BLUESHIFT_CREATE_LIST, 401, json!({"message": "bad key"})).await;

    let input = json!({"input": [
        InputEventBuilder::track("Product Viewed").metadata(json!({"jobId": 1})).build_json(),
        InputEventBuilder::group()
            .field("traits", json!({"name": "VIP", "description": "Top buyers"}))
            .metadata(json!({"jobId": 2}))
            .build_json(),
        InputEventBuilder::identify()
            .field("traits", json!({"email": "ada@example.com", "plan": "pro"}))
            .metadata(json!({"jobId": 3}))
            .build_json(),
        "not an event",
    ]});

    let app = app_from_config(&Config::default(), Some(mock.url()));
    let (status, body) = post(app, "/v0/destinations/blueshift/router", input).await;

    assert_eq!(status, StatusCode::OK);
    let output = body["output"].as_array().unwrap();
    assert_eq!(output.len(), 4);

    assert_eq!(output[0]["statusCode"], json!(200));
    assert_eq!(output[0]["metadata"], json!([{"jobId": 1}]));
    assert_eq!(output[0]["batchedRequest"]["body"]["JSON"]["event"], json!("view"));
    assert_eq!(
        output[0]["batchedRequest"]["endpoint"],
        json!(format!("{}/api/v1/event", mock.url()))
    );

    assert_eq!(output[1]["statusCode"], json!(400));
    assert_eq!(output[1]["metadata"], json!([{"jobId": 2}]));
    assert_eq!(output[1]["error"], json!("[Blueshift]:: Request failed with status code 401"));

    assert_eq!(output[2]["statusCode"], json!(200));
    assert_eq!(output[2]["batchedRequest"]["body"]["JSON"]["plan"], json!("pro"));

    assert_eq!(output[3]["statusCode"], json!(400));
    assert_eq!(output[3]["batched"], json!(false));

    mock.assert_request_count(1).await;
}
