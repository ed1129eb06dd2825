//! Builders and canned configurations for inbound events.

use ferry_core::{Destination, InputEvent};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Event API key used by [`blueshift_destination`].
pub const BLUESHIFT_EVENT_KEY: &str = "test-event-key";

/// Users API key used by [`blueshift_destination`].
pub const BLUESHIFT_USERS_KEY: &str = "test-users-key";

/// Blueshift destination with both API keys and the default data center.
pub fn blueshift_destination() -> Destination {
    Destination {
        config: json!({
            "eventApiKey": BLUESHIFT_EVENT_KEY,
            "usersApiKey": BLUESHIFT_USERS_KEY,
            "datacenterEU": false,
        }),
        extra: Map::new(),
    }
}

/// Destination with the given `Config` object.
pub fn destination_with_config(config: Value) -> Destination {
    Destination { config, extra: Map::new() }
}

/// Builder for test input events.
///
/// Every built event gets a unique `metadata.jobId` unless metadata is set
/// explicitly, so results can be matched back to inputs.
#[derive(Debug, Clone)]
pub struct InputEventBuilder {
    message: Map<String, Value>,
    destination: Destination,
    metadata: Option<Value>,
}

impl InputEventBuilder {
    /// Starts an event of the given `type`.
    pub fn new(kind: &str) -> Self {
        let mut message = Map::new();
        message.insert("type".to_string(), json!(kind));
        Self { message, destination: blueshift_destination(), metadata: None }
    }

    /// Starts a track event named `event` for user `u1`.
    pub fn track(event: &str) -> Self {
        Self::new("track").field("event", json!(event)).field("userId", json!("u1"))
    }

    /// Starts an identify event for user `u1`.
    pub fn identify() -> Self {
        Self::new("identify").field("userId", json!("u1"))
    }

    /// Starts a group event for user `u1`.
    pub fn group() -> Self {
        Self::new("group").field("userId", json!("u1"))
    }

    /// Sets a top-level message field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.message.insert(key.to_string(), value);
        self
    }

    /// Removes a top-level message field.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.message.remove(key);
        self
    }

    /// Sets the destination.
    #[must_use]
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builds the event.
    pub fn build(self) -> InputEvent {
        InputEvent {
            message: Value::Object(self.message),
            destination: self.destination,
            metadata: self.metadata.unwrap_or_else(|| json!({"jobId": Uuid::new_v4().to_string()})),
        }
    }

    /// Builds the event as its wire JSON.
    pub fn build_json(self) -> Value {
        let event = self.build();
        json!({
            "message": event.message,
            "destination": event.destination,
            "metadata": event.metadata,
        })
    }
}
