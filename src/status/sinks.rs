//! Bundled status sink implementations.

use crate::error::Result;
use crate::jobs::{JobStatus, StatusKind};
use crate::status::StatusSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// Sink collecting statuses in memory
///
/// Useful in tests and demos to observe the exact transition sequence of a
/// job.
#[derive(Debug, Default)]
pub struct MemoryStatusSink {
    statuses: Mutex<Vec<JobStatus>>,
}

impl MemoryStatusSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded statuses, in emission order
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.statuses.lock().clone()
    }

    /// Recorded status kinds, in emission order
    pub fn kinds(&self) -> Vec<StatusKind> {
        self.statuses.lock().iter().map(|s| s.status).collect()
    }

    /// Recorded status kinds for one job
    pub fn kinds_for(&self, job_id: &str) -> Vec<StatusKind> {
        self.statuses
            .lock()
            .iter()
            .filter(|s| s.job_id == job_id)
            .map(|s| s.status)
            .collect()
    }

    /// Drop all recorded statuses
    pub fn clear(&self) {
        self.statuses.lock().clear();
    }
}

#[async_trait]
impl StatusSink for MemoryStatusSink {
    async fn write_status(&self, status: &JobStatus) -> Result<()> {
        self.statuses.lock().push(status.clone());
        Ok(())
    }
}

/// Sink logging each transition through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingStatusSink;

impl TracingStatusSink {
    /// Create a new tracing sink
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatusSink for TracingStatusSink {
    async fn write_status(&self, status: &JobStatus) -> Result<()> {
        info!(
            job_id = %status.job_id,
            job_name = %status.job_name,
            queue_id = %status.queue_id,
            status = %status.status,
            details = status.details.as_deref().unwrap_or(""),
            "job status reported"
        );
        Ok(())
    }
}
