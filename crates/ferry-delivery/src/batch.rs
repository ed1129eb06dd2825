//! Batch reconciliation.
//!
//! A batch is processed one task per event. Every task's outcome lands in
//! the slot matching its input position, and a failing or panicking task
//! never disturbs its siblings. Failures are turned into error entries that
//! keep the event's metadata so the caller can correlate them.

use std::sync::Arc;

use ferry_core::{BatchOutput, BatchResult, InputEvent, TransformError};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::{processor::EventProcessor, sys_error::map_system_error};

/// Message used when a failure carries no text of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error occurred while processing payload.";

const INVALID_EVENT_ARRAY: &str = "Invalid event array";

/// Runs a destination's event processor across a batch.
#[derive(Debug, Clone)]
pub struct BatchReconciler {
    processor: Arc<dyn EventProcessor>,
}

impl BatchReconciler {
    /// Creates a reconciler for `processor`.
    pub fn new(processor: Arc<dyn EventProcessor>) -> Self {
        Self { processor }
    }

    /// Destination this reconciler serves.
    pub fn destination(&self) -> &'static str {
        self.processor.destination()
    }

    /// Processes a raw batch.
    ///
    /// Anything other than a non-empty array yields a single 400 entry with
    /// no metadata. Elements that do not decode as events fail individually.
    pub async fn process_batch(&self, input: Value) -> Vec<BatchResult> {
        match input {
            Value::Array(items) if !items.is_empty() => self.process_values(items).await,
            _ => {
                warn!(destination = self.destination(), "rejecting batch: not a non-empty array");
                vec![BatchResult::error(None, 400, INVALID_EVENT_ARRAY)]
            },
        }
    }

    /// Processes already-decoded events.
    pub async fn process_events(&self, events: Vec<InputEvent>) -> Vec<BatchResult> {
        if events.is_empty() {
            return vec![BatchResult::error(None, 400, INVALID_EVENT_ARRAY)];
        }

        let span =
            info_span!("process_batch", destination = self.destination(), size = events.len());
        let handles = events
            .into_iter()
            .map(|event| {
                let metadata = event.metadata.clone();
                let processor = Arc::clone(&self.processor);
                let handle =
                    tokio::spawn(async move { process_one(processor.as_ref(), event).await });
                (metadata, handle)
            })
            .collect();

        collect(handles).instrument(span).await
    }

    async fn process_values(&self, items: Vec<Value>) -> Vec<BatchResult> {
        let span =
            info_span!("process_batch", destination = self.destination(), size = items.len());
        let handles = items
            .into_iter()
            .map(|item| {
                let metadata = item.get("metadata").cloned().unwrap_or(Value::Null);
                let processor = Arc::clone(&self.processor);
                let fallback_metadata = metadata.clone();
                let handle = tokio::spawn(async move {
                    match serde_json::from_value::<InputEvent>(item) {
                        Ok(event) => process_one(processor.as_ref(), event).await,
                        Err(e) => failure(
                            fallback_metadata,
                            &TransformError::validation(format!("Invalid event: {e}")),
                        ),
                    }
                });
                (metadata, handle)
            })
            .collect();

        collect(handles).instrument(span).await
    }
}

/// Awaits each task in input order, replacing panics with error entries.
async fn collect(handles: Vec<(Value, JoinHandle<BatchResult>)>) -> Vec<BatchResult> {
    let mut results = Vec::with_capacity(handles.len());

    for (position, (metadata, handle)) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(result) => results.push(result),
            Err(join_error) => {
                error!(position, error = %join_error, "event task panicked");
                let error = TransformError::unclassified(DEFAULT_ERROR_MESSAGE);
                results.push(failure(metadata, &error));
            },
        }
    }

    results
}

async fn process_one(processor: &dyn EventProcessor, event: InputEvent) -> BatchResult {
    if event.is_transformed() {
        debug!("passing through transformed event");
        return BatchResult::success(
            BatchOutput::Passthrough(event.message),
            vec![event.metadata],
            event.destination,
        );
    }

    match processor.process(&event).await {
        Ok(request) => {
            debug!(endpoint = %request.endpoint, method = %request.method, "event processed");
            BatchResult::success(
                BatchOutput::Request(request),
                vec![event.metadata],
                event.destination,
            )
        },
        Err(e) => failure(event.metadata, &e),
    }
}

fn failure(metadata: Value, error: &TransformError) -> BatchResult {
    let status = resolve_status(error);
    warn!(status, kind = error.kind(), "event failed: {error}");

    let message = error.to_string();
    let message = if message.is_empty() { DEFAULT_ERROR_MESSAGE.to_string() } else { message };
    BatchResult::error(Some(vec![metadata]), status, message)
}

/// Resolves the status reported for a failed event.
///
/// A carried HTTP status wins; otherwise a carried OS/network code is mapped
/// through the system-error table; otherwise 400.
pub fn resolve_status(error: &TransformError) -> u16 {
    error
        .http_status()
        .or_else(|| error.system_code().map(|code| map_system_error(code).status))
        .unwrap_or(400)
}
