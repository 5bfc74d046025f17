//! # Handler Registry
//!
//! ## Architecture
//!
//! The registry merges two sources of handlers:
//! - **Direct handlers**, kept alive by the registry itself
//! - **Locators**, re-queried live on every lookup, so handler sets can be
//!   swapped or reloaded without notifying the listener
//!
//! Lookup checks locators first, in registration order, then direct
//! handlers; the first match wins. Deduplication in [`HandlerRegistry::handlers`]
//! is by handler *instance*, never by configuration content: two distinct
//! handlers for the same queue are two entries.

use crate::jobs::{HandlerLocator, JobHandler};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// Aggregates direct handlers and locator-provided handlers
#[derive(Default)]
pub struct HandlerRegistry {
    locators: RwLock<Vec<Arc<dyn HandlerLocator>>>,
    handlers: RwLock<Vec<Arc<dyn JobHandler>>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a locator; queried after previously-registered locators
    pub fn add_locator(&self, locator: Arc<dyn HandlerLocator>) {
        self.locators.write().push(locator);
    }

    /// Register a handler directly
    pub fn add_handler(&self, handler: Arc<dyn JobHandler>) {
        self.handlers.write().push(handler);
    }

    /// Resolve a handler for a queue id
    pub fn handler_by_queue_id(&self, queue_id: &str) -> Option<Arc<dyn JobHandler>> {
        for locator in self.locators.read().iter() {
            if let Some(handler) = locator.handler_by_queue_id(queue_id) {
                return Some(handler);
            }
        }

        let found = self
            .handlers
            .read()
            .iter()
            .find(|handler| handler.configuration().queue_id == queue_id)
            .cloned();

        if found.is_none() {
            warn!(queue_id = %queue_id, "handler for queue not found");
        }
        found
    }

    /// Union of locator-provided and directly-registered handlers,
    /// deduplicated by instance
    pub fn handlers(&self) -> Vec<Arc<dyn JobHandler>> {
        let mut all: Vec<Arc<dyn JobHandler>> = Vec::new();
        for locator in self.locators.read().iter() {
            all.extend(locator.handlers());
        }
        all.extend(self.handlers.read().iter().cloned());

        let mut unique: Vec<Arc<dyn JobHandler>> = Vec::new();
        for handler in all {
            if !unique.iter().any(|seen| Arc::ptr_eq(seen, &handler)) {
                unique.push(handler);
            }
        }
        unique
    }
}
