//! Blueshift event processor.
//!
//! Track events go to the event API with the event key; identify and group
//! events go to the customer and list APIs with the users key. A group event
//! that names no list creates one first through the transport.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ferry_core::{
    path::is_truthy, Destination, HttpMethod, InputEvent, PathExt, RequestDescriptor, Result,
    TransformError,
};
use serde_json::{Map, Value};
use tracing::{debug, info_span, warn, Instrument};

use super::{
    event_type,
    mapping::{construct_payload, extract_custom_fields, MappingField},
    unsupported, EventProcessor, EventType,
};
use crate::transport::Transport;

/// Destination name.
pub const DESTINATION: &str = "blueshift";

/// Default API host.
pub const BASE_URL: &str = "https://api.getblueshift.com";

/// API host for EU data-center accounts.
pub const BASE_URL_EU: &str = "https://api.eu.getblueshift.com";

const MAX_EVENT_NAME_LEN: usize = 64;

const FAILED_TO_CONSTRUCT_PAYLOAD: &str = "Failed to construct payload";

const TRACK_FIELDS: &[MappingField] = &[
    MappingField::required("event", &["event"]),
    MappingField::optional("customer_id", &["userId"]),
    MappingField::optional("cookie", &["anonymousId"]),
    MappingField::optional("email", &["context.traits.email", "properties.email"]),
    MappingField::optional("device_type", &["context.device.type"]),
    MappingField::optional("device_id", &["context.device.id"]),
    MappingField::optional("device_idfa", &["context.device.advertisingId"]),
    MappingField::optional("device_manufacturer", &["context.device.manufacturer"]),
    MappingField::optional("os_name", &["context.os.name"]),
    MappingField::optional("network_carrier", &["context.network.carrier"]),
    MappingField::optional("ip", &["context.ip", "request_ip"]),
    MappingField::optional("latitude", &["context.location.latitude"]),
    MappingField::optional("longitude", &["context.location.longitude"]),
    MappingField::optional("timestamp", &["timestamp", "originalTimestamp"]),
];

const IDENTIFY_FIELDS: &[MappingField] = &[
    MappingField::optional("customer_id", &["userId", "traits.userId", "context.traits.userId"]),
    MappingField::optional("email", &["traits.email", "context.traits.email"]),
    MappingField::optional("firstname", &["traits.firstName", "context.traits.firstName"]),
    MappingField::optional("lastname", &["traits.lastName", "context.traits.lastName"]),
    MappingField::optional("gender", &["traits.gender", "context.traits.gender"]),
    MappingField::optional("phone_number", &["traits.phone", "context.traits.phone"]),
    MappingField::optional("joined_at", &["traits.createdAt", "context.traits.createdAt"]),
    MappingField::optional("timestamp", &["timestamp", "originalTimestamp"]),
];

/// Trait keys already carried under a renamed payload key.
const IDENTIFY_EXCLUSIONS: &[&str] =
    &["userId", "email", "firstName", "lastName", "gender", "phone", "createdAt"];

const GROUP_FIELDS: &[MappingField] = &[
    MappingField::required("identifier_value", &["userId"]),
    MappingField::optional("list_id", &["groupId", "traits.list_id"]),
    MappingField::optional("name", &["traits.name", "context.traits.name"]),
    MappingField::optional("description", &["traits.description", "context.traits.description"]),
];

/// Ecommerce event names with a native Blueshift counterpart.
const EVENT_NAMES: &[(&str, &str)] = &[
    ("Product Viewed", "view"),
    ("Product Added", "add_to_cart"),
    ("Product Removed", "remove_from_cart"),
    ("Products Searched", "search"),
    ("Cart Viewed", "cart_view"),
    ("Checkout Started", "checkout"),
    ("Order Completed", "purchase"),
    ("Product Added to Wishlist", "wishlist"),
    ("Product Shared", "share"),
];

/// Builds Blueshift requests.
#[derive(Debug, Clone)]
pub struct BlueshiftProcessor {
    transport: Arc<dyn Transport>,
    base_url: String,
    base_url_eu: String,
}

impl BlueshiftProcessor {
    /// Creates a processor that issues list-creation calls over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, base_url: BASE_URL.to_string(), base_url_eu: BASE_URL_EU.to_string() }
    }

    /// Overrides both API hosts, for staging accounts and tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.base_url_eu.clone_from(&self.base_url);
        self
    }

    fn base_url(&self, destination: &Destination) -> &str {
        if destination.config_flag("datacenterEU") {
            &self.base_url_eu
        } else {
            &self.base_url
        }
    }

    fn track(&self, message: &Value, destination: &Destination) -> Result<RequestDescriptor> {
        let event = message
            .str_at("event")
            .map(str::trim)
            .filter(|event| !event.is_empty())
            .ok_or_else(|| {
                TransformError::validation("[Blueshift] property:: event is required for track call")
            })?;
        let api_key = destination.config_str("eventApiKey").ok_or_else(|| {
            TransformError::validation("[BLUESHIFT] event Api Keys required for Authentication.")
        })?;

        let mut payload = construct_payload(message, TRACK_FIELDS)
            .ok_or_else(|| TransformError::validation(FAILED_TO_CONSTRUCT_PAYLOAD))?;

        let event_name = normalize_event_name(event);
        if !is_valid_event_name(&event_name) {
            return Err(TransformError::validation(
                "[Blueshift] Event shouldn't contain period(.), numeric value and contains not more than 64 characters",
            ));
        }
        payload.insert("event".to_string(), Value::String(event_name));

        let payload = extract_custom_fields(message, payload, &["properties"], &["cookie"]);

        let endpoint = format!("{}/api/v1/event", self.base_url(destination));
        Ok(request(HttpMethod::Post, endpoint, api_key).with_json(payload))
    }

    fn identify(&self, message: &Value, destination: &Destination) -> Result<RequestDescriptor> {
        let api_key = users_api_key(destination)?;

        let payload = construct_payload(message, IDENTIFY_FIELDS)
            .ok_or_else(|| TransformError::validation(FAILED_TO_CONSTRUCT_PAYLOAD))?;
        let payload = extract_custom_fields(
            message,
            payload,
            &["traits", "context.traits"],
            IDENTIFY_EXCLUSIONS,
        );

        let endpoint = format!("{}/api/v1/customers", self.base_url(destination));
        Ok(request(HttpMethod::Post, endpoint, api_key).with_json(payload))
    }

    async fn group(&self, message: &Value, destination: &Destination) -> Result<RequestDescriptor> {
        let api_key = users_api_key(destination)?;
        let base_url = self.base_url(destination);

        let mut payload = construct_payload(message, GROUP_FIELDS)
            .ok_or_else(|| TransformError::validation(FAILED_TO_CONSTRUCT_PAYLOAD))?;

        let list_id = match payload.get("list_id").filter(|id| is_truthy(id)) {
            Some(id) => id.clone(),
            None => self.create_list(&payload, base_url, api_key).await?,
        };
        let list_segment = match &list_id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        };

        payload.insert("list_id".to_string(), list_id);
        // identifier_value carries userId
        payload.insert("identifier_key".to_string(), Value::String("customer_id".to_string()));

        Ok(request(
            HttpMethod::Put,
            format!("{base_url}/api/v1/custom_user_lists/add_user_to_list/{list_segment}"),
            api_key,
        )
        .with_json(payload))
    }

    /// Creates an empty list named by the group traits and returns its id.
    async fn create_list(
        &self,
        payload: &Map<String, Value>,
        base_url: &str,
        api_key: &str,
    ) -> Result<Value> {
        let has = |key: &str| payload.get(key).is_some_and(is_truthy);
        if !(has("name") && has("description")) {
            return Err(TransformError::validation(
                "[Blueshift]:: name and description are required to create an empty list, or List Id is required to add user.",
            ));
        }

        let create = request(
            HttpMethod::Post,
            format!("{base_url}/api/v1/custom_user_lists/create"),
            api_key,
        )
        .with_json(payload.clone());

        let span = info_span!("blueshift_create_list", endpoint = %create.endpoint);
        let raw = self.transport.send(&create).instrument(span).await;

        let succeeded = raw.at_path("success").and_then(Value::as_bool) == Some(true);
        match raw.at_path("response.data.id").filter(|id| is_truthy(id)) {
            Some(id) if succeeded => {
                debug!(destination = DESTINATION, list_id = %id, "created list");
                Ok(id.clone())
            },
            _ => {
                let reason = raw
                    .first_at(&["response.message", "response.data.message"])
                    .and_then(Value::as_str)
                    .unwrap_or("list creation failed");
                warn!(destination = DESTINATION, "list creation failed: {reason}");
                Err(TransformError::validation(format!("[Blueshift]:: {reason}")))
            },
        }
    }
}

#[async_trait]
impl EventProcessor for BlueshiftProcessor {
    fn destination(&self) -> &'static str {
        DESTINATION
    }

    async fn process(&self, event: &InputEvent) -> Result<RequestDescriptor> {
        let message = &event.message;
        let destination = &event.destination;

        match event_type(event)? {
            EventType::Track => self.track(message, destination),
            EventType::Identify => self.identify(message, destination),
            EventType::Group => self.group(message, destination).await,
            other => Err(unsupported(other)),
        }
    }
}

fn users_api_key(destination: &Destination) -> Result<&str> {
    destination.config_str("usersApiKey").ok_or_else(|| {
        TransformError::validation("[BLUESHIFT] User API Key required for Authentication.")
    })
}

fn request(method: HttpMethod, endpoint: String, api_key: &str) -> RequestDescriptor {
    RequestDescriptor::new(method, endpoint)
        .with_header("Authorization", format!("Basic {}", STANDARD.encode(api_key)))
        .with_header("Content-Type", "application/json")
}

/// Maps ecommerce names to native ones and joins whitespace runs with `_`.
fn normalize_event_name(event: &str) -> String {
    let mapped = EVENT_NAMES
        .iter()
        .find_map(|(name, native)| (*name == event).then_some(*native))
        .unwrap_or(event);
    mapped.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Length is counted in UTF-16 code units, as Blueshift measures it.
fn is_valid_event_name(event: &str) -> bool {
    !event.contains('.')
        && !event.chars().any(|c| c.is_ascii_digit())
        && event.encode_utf16().count() <= MAX_EVENT_NAME_LEN
}
