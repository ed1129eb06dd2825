//! Event processors: one generic event in, one outbound request out.
//!
//! Each destination implements [`EventProcessor`]. Dispatch on the event's
//! `type` goes through the closed [`EventType`] enum; kinds a destination
//! does not build requests for fail fast with a 400 naming the kind.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use ferry_core::{InputEvent, RequestDescriptor, Result, TransformError};

pub mod blueshift;
pub mod mapping;

pub use blueshift::BlueshiftProcessor;

/// Event kinds carried in `message.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// User traits update.
    Identify,
    /// User action.
    Track,
    /// User joins a group or list.
    Group,
    /// Page view.
    Page,
    /// Mobile screen view.
    Screen,
    /// Identity merge.
    Alias,
}

impl EventType {
    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Track => "track",
            Self::Group => "group",
            Self::Page => "page",
            Self::Screen => "screen",
            Self::Alias => "alias",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = TransformError;

    /// Case-insensitive parse.
    fn from_str(kind: &str) -> Result<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "identify" => Ok(Self::Identify),
            "track" => Ok(Self::Track),
            "group" => Ok(Self::Group),
            "page" => Ok(Self::Page),
            "screen" => Ok(Self::Screen),
            "alias" => Ok(Self::Alias),
            other => Err(unsupported(other)),
        }
    }
}

/// Resolves the event's kind.
///
/// # Errors
///
/// Returns a validation error when `message.type` is absent, and when it
/// names no known kind.
pub fn event_type(event: &InputEvent) -> Result<EventType> {
    let kind = event.message_type().ok_or_else(|| {
        TransformError::validation("Message Type is not present. Aborting message.")
    })?;
    kind.parse()
}

/// Validation error for a kind the destination cannot handle.
pub fn unsupported(kind: impl fmt::Display) -> TransformError {
    TransformError::validation(format!("Message type {kind} not supported"))
}

/// Builds the outbound request for one event of one destination.
#[async_trait]
pub trait EventProcessor: Send + Sync + fmt::Debug {
    /// Destination name.
    fn destination(&self) -> &'static str;

    /// Transforms one event into a request descriptor.
    ///
    /// # Errors
    ///
    /// Returns a structured [`TransformError`]; never panics on malformed
    /// input.
    async fn process(&self, event: &InputEvent) -> Result<RequestDescriptor>;
}
