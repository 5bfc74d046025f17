//! Job request envelopes: the transported `JobRequest` and the in-memory
//! `ProcessingRequest` built once per received message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A job as transported on a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Discriminator for the kind of work to perform
    #[serde(rename = "type")]
    pub job_type: String,
    /// Backend-formatted payload for the handler
    pub payload: Option<String>,
}

impl JobRequest {
    /// Create a new job request
    pub fn new(job_type: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            job_type: job_type.into(),
            payload,
        }
    }
}

impl fmt::Display for JobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job '{}'", self.job_type)
    }
}

/// The dispatch-ready view of a received job
///
/// Constructed once per received transport message and owned by a single
/// dispatch attempt; never shared mutably between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    /// Unique identifier for the job (the transport message id)
    pub job_id: String,
    /// Human-readable name for the job (the transport message label)
    pub name: String,
    /// Identifier of the queue the request originated from
    pub queue_id: String,
    /// Descriptive name of the originating queue
    pub queue_name: String,
    /// Body of the job request
    pub job_request: JobRequest,
}

impl fmt::Display for ProcessingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "unnamed"
        } else {
            self.name.as_str()
        };
        if self.queue_name.trim().is_empty() {
            write!(f, "request for job {} ({}) on {}", self.job_id, name, self.queue_id)
        } else {
            write!(
                f,
                "request for job {} ({}) on {} ({})",
                self.job_id, name, self.queue_name, self.queue_id
            )
        }
    }
}
