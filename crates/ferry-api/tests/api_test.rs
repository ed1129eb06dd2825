//! HTTP surface tests: routing, status mapping and error responses.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{body::Body, http::StatusCode, Router};
use ferry_api::{create_router, AppState};
use ferry_delivery::{
    processor::BlueshiftProcessor, DestinationRegistry, HttpTransport, OutcomeClassifier,
};
use ferry_testing::{http::BLUESHIFT_CREATE_LIST, InputEventBuilder, MockDestination};
use http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;

const BLUESHIFT_ROUTER: &str = "/v0/destinations/blueshift/router";
const BQSTREAM_PROXY: &str = "/v0/destinations/bqstream/proxy-response";

fn registry() -> (Arc<HttpTransport>, DestinationRegistry) {
    let transport = Arc::new(HttpTransport::with_defaults().unwrap());
    let registry =
        DestinationRegistry::with_defaults(transport.clone(), OutcomeClassifier::default());
    (transport, registry)
}

fn app() -> Router {
    create_router(AppState::new(registry().1))
}

fn app_against(mock: &MockDestination) -> Router {
    let (transport, mut registry) = registry();
    let blueshift = BlueshiftProcessor::new(transport).with_base_url(mock.url());
    registry.register_processor(Arc::new(blueshift));
    create_router(AppState::new(registry))
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value, Option<String>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, Body::from))
        .unwrap();

    let response = app.oneshot(request).await.expect("failed to make request");
    let status = response.status();
    let request_id =
        response.headers().get("x-request-id").map(|value| value.to_str().unwrap().to_string());
    let bytes =
        axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };

    (status, body, request_id)
}

#[tokio::test]
async fn health_lists_destinations() {
    let (status, body, request_id) = send(app(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["destinations"], json!(["blueshift"]));
    assert!(request_id.is_some());
}

#[tokio::test]
async fn liveness_is_alive() {
    let (status, body, _) = send(app(), "GET", "/live", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("alive"));
}

#[tokio::test]
async fn health_without_destinations_is_unavailable() {
    let app = create_router(AppState::new(DestinationRegistry::new()));

    let (status, body, _) = send(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("unhealthy"));
}

#[tokio::test]
async fn inbound_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/live")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn router_returns_positional_output() {
    let input = json!({"input": [
        InputEventBuilder::track("Order Completed").metadata(json!({"jobId": 1})).build_json(),
        InputEventBuilder::new("page").metadata(json!({"jobId": 2})).build_json(),
    ]});

    let (status, body, _) =
        send(app(), "POST", BLUESHIFT_ROUTER, Some(input.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let output = body["output"].as_array().unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(output[0]["statusCode"], json!(200));
    assert_eq!(output[0]["batchedRequest"]["body"]["JSON"]["event"], json!("purchase"));
    assert_eq!(output[0]["metadata"], json!([{"jobId": 1}]));
    assert_eq!(output[1]["statusCode"], json!(400));
    assert_eq!(output[1]["error"], json!("Message type page not supported"));
    assert_eq!(output[1]["metadata"], json!([{"jobId": 2}]));
}

#[tokio::test]
async fn router_with_missing_input_reports_invalid_array() {
    let (status, body, _) =
        send(app(), "POST", BLUESHIFT_ROUTER, Some("{}".to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["output"],
        json!([{
            "metadata": null,
            "batched": false,
            "statusCode": 400,
            "error": "Invalid event array"
        }])
    );
}

#[tokio::test]
async fn router_group_event_creates_list_through_mock() {
    let mock = MockDestination::start().await;
    mock.respond_json(BLUESHIFT_CREATE_LIST, 200, json!({"id": "list-1"})).await;

    let input = json!({"input": [
        InputEventBuilder::group()
            .field("traits", json!({"name": "VIP", "description": "Top"}))
            .build_json(),
    ]});

    let (status, body, _) =
        send(app_against(&mock), "POST", BLUESHIFT_ROUTER, Some(input.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["output"][0]["batchedRequest"]["endpoint"],
        json!(format!("{}/api/v1/custom_user_lists/add_user_to_list/list-1", mock.url()))
    );
    mock.assert_request_count(1).await;
}

#[tokio::test]
async fn unknown_destination_is_client_error() {
    let body = Some(json!({"input": []}).to_string());
    let (status, body, _) = send(app(), "POST", "/v0/destinations/nowhere/router", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("E1001"));
    assert_eq!(
        body["error"]["message"],
        json!("[E1001] Unknown destination: nowhere is not supported")
    );
}

#[tokio::test]
async fn invalid_json_is_client_error() {
    let (status, body, _) =
        send(app(), "POST", BLUESHIFT_ROUTER, Some("{not json".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("E1002"));
}

#[tokio::test]
async fn proxy_response_uses_classified_status() {
    let proxy = json!({
        "responseBody": {"error": {"status": "PERMISSION_DENIED", "message": "Access Denied"}},
        "status": 403,
        "payload": {"headers": {"Authorization": "Bearer tok"}}
    });

    let (status, body, _) =
        send(app(), "POST", BQSTREAM_PROXY, Some(proxy.to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["authErrorCategory"], json!("DISABLE_DESTINATION"));
    assert_eq!(body["accessToken"], json!("tok"));
    assert_eq!(body["statTags"]["meta"], json!("retryable"));
    assert_eq!(body["isFailure"], json!(true));
}

#[tokio::test]
async fn proxy_response_success() {
    let proxy = json!({"responseBody": "{}", "status": 200, "payload": {}});

    let (status, body, _) =
        send(app(), "POST", BQSTREAM_PROXY, Some(proxy.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Request Processed successfully"));
    assert_eq!(body["statTags"]["scope"], json!("api"));
}

#[tokio::test]
async fn proxy_response_without_status_is_bad_request() {
    let (status, body, _) =
        send(app(), "POST", BQSTREAM_PROXY, Some(json!({"responseBody": {}}).to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("[ResponseTransform]: Destination Response Body and(or) Status Invalid, for destination: bqstream")
    );
}
