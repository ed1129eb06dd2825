//! HTTP mock of a destination API.

use serde_json::Value;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Path of the Blueshift list-creation endpoint.
pub const BLUESHIFT_CREATE_LIST: &str = "/api/v1/custom_user_lists/create";

/// Mock destination API on a random local port.
pub struct MockDestination {
    server: MockServer,
}

impl MockDestination {
    /// Starts a new mock destination.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Base URL of the mock.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Answers `POST <path>` with `status` and a JSON body.
    pub async fn respond_json(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answers `POST <path>` with `status` only when `Authorization` matches.
    pub async fn respond_json_with_auth(
        &self,
        route: &str,
        authorization: &str,
        status: u16,
        body: Value,
    ) {
        Mock::given(method("POST"))
            .and(path(route))
            .and(header("Authorization", authorization))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Requests received so far.
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Asserts that exactly `expected` requests were received.
    pub async fn assert_request_count(&self, expected: usize) {
        let requests = self.received_requests().await;
        assert_eq!(
            requests.len(),
            expected,
            "Expected {} requests, received {}",
            expected,
            requests.len()
        );
    }
}
