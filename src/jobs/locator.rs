//! Pluggable handler sources.

use crate::jobs::handler::JobHandler;
use std::sync::Arc;

/// An external, queryable source of handlers
///
/// Locators are re-queried on every lookup, so a handler can disappear from
/// (or appear in) a locator without notifying the listener; a handler absent
/// from every source at lookup time simply yields no match.
pub trait HandlerLocator: Send + Sync {
    /// Retrieve a handler by the id of the queue it listens on
    fn handler_by_queue_id(&self, queue_id: &str) -> Option<Arc<dyn JobHandler>>;

    /// All handlers currently available from this locator
    fn handlers(&self) -> Vec<Arc<dyn JobHandler>>;
}
