//! # Status Sinks
//!
//! A status sink is an external observer persisting or reporting
//! [`JobStatus`] transitions. Sinks are invoked sequentially for each
//! transition; a sink that fails is logged and never blocks dispatch or
//! the other sinks.

pub mod sinks;

pub use sinks::{MemoryStatusSink, TracingStatusSink};

use crate::error::Result;
use crate::jobs::JobStatus;
use async_trait::async_trait;

/// Observer recording job status transitions
///
/// Implementations must tolerate concurrent invocation for different jobs.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Record a status transition
    async fn write_status(&self, status: &JobStatus) -> Result<()>;
}
