//! Destination delivery: request building, response classification and
//! batch reconciliation.
//!
//! # Architecture
//!
//! Events flow through two independent paths:
//!
//! 1. **Router** - a [`BatchReconciler`] runs a destination's
//!    [`EventProcessor`] over every event of a batch concurrently and
//!    returns one positional result per event.
//! 2. **Proxy response** - a [`ResponseHandler`] classifies what the
//!    destination answered into a [`ferry_core::StandardizedResult`].
//!
//! Both paths share the [`classify`](mod@classify) policy and the system-error table in
//! [`sys_error`]. The [`DestinationRegistry`] maps destination names to
//! their processor and handler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ferry_delivery::{DestinationRegistry, HttpTransport, OutcomeClassifier};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::with_defaults()?);
//! let registry = DestinationRegistry::with_defaults(transport, OutcomeClassifier::default());
//!
//! if let Some(reconciler) = registry.reconciler("blueshift") {
//!     let output = reconciler.process_batch(json!([])).await;
//!     assert_eq!(output[0].status_code(), 400);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod classify;
pub mod normalize;
pub mod processor;
pub mod registry;
pub mod response;
pub mod sys_error;
pub mod transport;

pub use batch::BatchReconciler;
pub use classify::{classify, OutcomeClassifier, RetryableStatuses};
pub use normalize::{normalize, NormalizedResponse};
pub use processor::{EventProcessor, EventType};
pub use registry::DestinationRegistry;
pub use response::{parse_dest_response, parse_dest_response_with, ResponseHandler};
pub use sys_error::{map_system_error, SystemErrorStatus};
pub use transport::{HttpTransport, Transport, TransportConfig};
