//! Test infrastructure for ferry crates.
//!
//! Provides event builders, canned destination configurations and an HTTP
//! mock standing in for a destination API.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod http;

pub use fixtures::{blueshift_destination, InputEventBuilder};
pub use http::MockDestination;
