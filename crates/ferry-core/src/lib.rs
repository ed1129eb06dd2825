//! Core value types for destination delivery.
//!
//! Every entity here is request-scoped: constructed fresh per event and
//! discarded once the surrounding call returns. Nothing is persisted and no
//! state is shared between requests. The delivery crate builds on these
//! types to classify destination responses and reconcile batches.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod path;

pub use error::{DestinationError, Result, TransformError};
pub use models::{
    AuthErrorCategory, BatchError, BatchOutput, BatchResult, BatchSuccess, Destination,
    HttpMethod, InputEvent, OutcomeCategory, RequestBody, RequestDescriptor, StandardizedResult,
    StandardizedResultBuilder, StatTags,
};
pub use path::PathExt;
