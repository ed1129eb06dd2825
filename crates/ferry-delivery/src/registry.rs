//! Destination lookup by name.

use std::{collections::HashMap, sync::Arc};

use crate::{
    batch::BatchReconciler,
    classify::OutcomeClassifier,
    processor::{BlueshiftProcessor, EventProcessor},
    response::{BqStreamHandler, ResponseHandler},
    transport::Transport,
};

/// Event processors and response handlers keyed by destination name.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DestinationRegistry {
    processors: HashMap<String, Arc<dyn EventProcessor>>,
    handlers: HashMap<String, Arc<dyn ResponseHandler>>,
}

impl DestinationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in destination.
    ///
    /// `transport` serves processors that call the destination while
    /// building a request; `classifier` decides outcome categories for
    /// response handlers.
    pub fn with_defaults(transport: Arc<dyn Transport>, classifier: OutcomeClassifier) -> Self {
        let mut registry = Self::new();
        registry.register_processor(Arc::new(BlueshiftProcessor::new(transport)));
        registry.register_handler(Arc::new(BqStreamHandler::new(classifier)));
        registry
    }

    /// Registers a processor under its destination name, replacing any other.
    pub fn register_processor(&mut self, processor: Arc<dyn EventProcessor>) {
        self.processors.insert(processor.destination().to_ascii_lowercase(), processor);
    }

    /// Registers a response handler under its destination name.
    pub fn register_handler(&mut self, handler: Arc<dyn ResponseHandler>) {
        self.handlers.insert(handler.destination().to_ascii_lowercase(), handler);
    }

    /// Event processor for `destination`.
    pub fn processor(&self, destination: &str) -> Option<Arc<dyn EventProcessor>> {
        self.processors.get(&destination.to_ascii_lowercase()).cloned()
    }

    /// Response handler for `destination`.
    pub fn handler(&self, destination: &str) -> Option<Arc<dyn ResponseHandler>> {
        self.handlers.get(&destination.to_ascii_lowercase()).cloned()
    }

    /// Batch reconciler over the processor for `destination`.
    pub fn reconciler(&self, destination: &str) -> Option<BatchReconciler> {
        self.processor(destination).map(BatchReconciler::new)
    }

    /// Names with a registered processor, sorted.
    pub fn processor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
