//! Outbound HTTP transport for embedded destination calls.
//!
//! Some event processors must call the destination before their request can
//! be finalized. The transport sends a [`RequestDescriptor`] and always
//! answers with a raw response tree, never an error, so callers read
//! success and failure through the same normalizer:
//!
//! ```text
//! {"success": true,  "response": {"status", "statusText", "headers", "data"}}
//! {"success": false, "response": {"status", "statusText", "headers", "data", "message"}}
//! {"success": false, "response": {"code": "ECONNREFUSED", "message"}}
//! ```

use std::{error::Error as StdError, fmt, io, time::Duration};

use async_trait::async_trait;
use ferry_core::{HttpMethod, RequestDescriptor};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info_span, Instrument};

/// Sends outbound requests on behalf of event processors.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the raw response tree.
    async fn send(&self, request: &RequestDescriptor) -> Value;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: "Ferry-Transformer/1.0".to_string() }
    }
}

/// Failure to construct the HTTP client.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct TransportBuildError(#[from] reqwest::Error);

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportBuildError`] if the HTTP client cannot be built.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportBuildError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Creates a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportBuildError`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, TransportBuildError> {
        Self::new(&TransportConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Value {
        let span = info_span!(
            "destination_call",
            method = %request.method,
            endpoint = %request.endpoint,
        );

        async move {
            let mut http_request = match request.method {
                HttpMethod::Get => self.client.get(&request.endpoint),
                HttpMethod::Post => self.client.post(&request.endpoint),
                HttpMethod::Put => self.client.put(&request.endpoint),
            };

            for (name, value) in &request.headers {
                http_request = http_request.header(name, value);
            }
            if !request.params.is_empty() {
                http_request = http_request.query(&request.params);
            }
            if request.method != HttpMethod::Get {
                http_request = http_request.json(&request.body.json);
            }

            let response = match http_request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let code = system_code(&e);
                    tracing::warn!(code, "destination call failed: {}", e);
                    return json!({
                        "success": false,
                        "response": {"code": code, "message": e.to_string()}
                    });
                },
            };

            let status = response.status();
            let headers = extract_headers(response.headers());
            let data = match response.bytes().await {
                Ok(bytes) => decode_body(&bytes),
                Err(e) => {
                    tracing::warn!("failed to read destination response body: {}", e);
                    Value::String(String::new())
                },
            };

            tracing::debug!(status = status.as_u16(), "destination responded");

            let mut body = json!({
                "status": status.as_u16(),
                "statusText": status.canonical_reason().unwrap_or_default(),
                "headers": headers,
                "data": data,
            });
            if !status.is_success() {
                body["message"] =
                    json!(format!("Request failed with status code {}", status.as_u16()));
            }

            json!({"success": status.is_success(), "response": body})
        }
        .instrument(span)
        .await
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Extracts headers with valid string values.
fn extract_headers(header_map: &HeaderMap) -> Map<String, Value> {
    header_map
        .iter()
        .filter_map(|(key, value)| {
            value.to_str().ok().map(|value| (key.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

/// Code reported for failures that carry no recognizable OS error. It is
/// absent from the system-error table, so it resolves to 400.
pub const UNKNOWN_SYSTEM_CODE: &str = "EUNKNOWN";

/// Derives an OS-style error code from a request failure.
///
/// Walks the source chain for an I/O error first; falls back to the
/// request-level flags.
pub fn system_code(error: &reqwest::Error) -> &'static str {
    let mut source = error.source();
    while let Some(current) = source {
        if let Some(io_error) = current.downcast_ref::<io::Error>() {
            if let Some(code) = io_error_code(io_error.kind()) {
                return code;
            }
        }
        source = current.source();
    }

    if error.is_timeout() {
        "ETIMEDOUT"
    } else if error.is_connect() {
        "ECONNREFUSED"
    } else {
        UNKNOWN_SYSTEM_CODE
    }
}

fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => Some("ECONNRESET"),
        io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        io::ErrorKind::PermissionDenied => Some("EACCES"),
        io::ErrorKind::AddrInUse => Some("EADDRINUSE"),
        io::ErrorKind::BrokenPipe => Some("EPIPE"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn post(url: String) -> RequestDescriptor {
        let mut body = Map::new();
        body.insert("name".to_string(), json!("vip"));
        RequestDescriptor::new(HttpMethod::Post, url)
            .with_header("Content-Type", "application/json")
            .with_json(body)
    }

    #[tokio::test]
    async fn successful_call_reports_json_data() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/lists"))
            .and(matchers::body_json(json!({"name": "vip"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
            .mount(&server)
            .await;

        let transport = HttpTransport::with_defaults().unwrap();
        let raw = transport.send(&post(format!("{}/lists", server.uri()))).await;

        assert_eq!(raw["success"], json!(true));
        assert_eq!(raw["response"]["status"], json!(200));
        assert_eq!(raw["response"]["data"]["id"], json!(42));
        assert_eq!(raw["response"]["statusText"], json!("OK"));
    }

    #[tokio::test]
    async fn error_status_is_unsuccessful_with_message() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
            .mount(&server)
            .await;

        let transport = HttpTransport::with_defaults().unwrap();
        let raw = transport.send(&post(format!("{}/lists", server.uri()))).await;

        assert_eq!(raw["success"], json!(false));
        assert_eq!(raw["response"]["status"], json!(422));
        assert_eq!(raw["response"]["data"], json!("unprocessable"));
        assert_eq!(raw["response"]["message"], json!("Request failed with status code 422"));
    }

    #[tokio::test]
    async fn headers_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("PUT"))
            .and(matchers::header("Authorization", "Basic a2V5"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = HttpTransport::with_defaults().unwrap();
        let request = RequestDescriptor::new(HttpMethod::Put, format!("{}/x", server.uri()))
            .with_header("Authorization", "Basic a2V5");
        let raw = transport.send(&request).await;

        assert_eq!(raw["success"], json!(true));
        assert_eq!(raw["response"]["data"], json!(""));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_system_code() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let transport = HttpTransport::with_defaults().unwrap();
        let raw = transport.send(&post(format!("http://127.0.0.1:{port}/lists"))).await;

        assert_eq!(raw["success"], json!(false));
        assert_eq!(raw["response"]["code"], json!("ECONNREFUSED"));
        assert!(raw["response"]["message"].is_string());
    }

    #[test]
    fn unrecognized_failures_use_neutral_code() {
        let error = reqwest::Client::new().get("not a url").build().unwrap_err();

        assert!(error.is_builder());
        assert_eq!(system_code(&error), UNKNOWN_SYSTEM_CODE);
        assert_eq!(crate::sys_error::map_system_error(UNKNOWN_SYSTEM_CODE).status, 400);
    }

    #[test]
    fn io_kinds_map_to_codes() {
        assert_eq!(io_error_code(io::ErrorKind::ConnectionRefused), Some("ECONNREFUSED"));
        assert_eq!(io_error_code(io::ErrorKind::TimedOut), Some("ETIMEDOUT"));
        assert_eq!(io_error_code(io::ErrorKind::Other), None);
    }

    #[test]
    fn headers_extracted_as_strings() {
        let mut map = HeaderMap::new();
        map.insert("retry-after", "30".parse().unwrap());
        let headers = extract_headers(&map);
        assert_eq!(headers.get("retry-after"), Some(&json!("30")));
    }
}
