//! Job status records emitted at each lifecycle transition.

use crate::jobs::request::ProcessingRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state recorded in a [`JobStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// A queue has received the request
    Received,
    /// A handler is currently processing the request
    Processing,
    /// No registered handler was able to take the request
    Skipped,
    /// Dispatch was short-circuited by a cancellation
    Canceled,
    /// The request was processed successfully
    Complete,
    /// Processing of the request failed
    Failed,
    /// The request stalled during processing
    Stalled,
    /// Processing exceeded the configured job timeout
    TimedOut,
    /// The request was re-sent to another queue
    Redirected,
}

impl StatusKind {
    /// True for states that end a processing attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusKind::Skipped
                | StatusKind::Canceled
                | StatusKind::Complete
                | StatusKind::Failed
                | StatusKind::TimedOut
        )
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusKind::Received => "Received",
            StatusKind::Processing => "Processing",
            StatusKind::Skipped => "Skipped",
            StatusKind::Canceled => "Canceled",
            StatusKind::Complete => "Complete",
            StatusKind::Failed => "Failed",
            StatusKind::Stalled => "Stalled",
            StatusKind::TimedOut => "TimedOut",
            StatusKind::Redirected => "Redirected",
        };
        write!(f, "{name}")
    }
}

/// Immutable status record for one lifecycle transition
///
/// One instance is created per transition; records are never reused or
/// mutated. `created_on` is stamped at emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Unique identifier for the message containing the job request
    pub job_id: String,
    /// Human-readable name for the job
    pub job_name: String,
    /// Identifier of the originating queue
    pub queue_id: String,
    /// Descriptive name of the originating queue
    pub queue_name: String,
    /// Lifecycle state being recorded
    pub status: StatusKind,
    /// Further detail, e.g. failure text or a redirect target
    pub details: Option<String>,
    /// When this record was created
    pub created_on: DateTime<Utc>,
}

impl JobStatus {
    /// Build a status record for the given request, stamped now
    pub fn for_request(
        request: &ProcessingRequest,
        status: StatusKind,
        details: Option<String>,
    ) -> Self {
        Self {
            job_id: request.job_id.clone(),
            job_name: request.name.clone(),
            queue_id: request.queue_id.clone(),
            queue_name: request.queue_name.clone(),
            status,
            details,
            created_on: Utc::now(),
        }
    }
}
