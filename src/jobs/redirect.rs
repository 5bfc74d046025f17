//! Outcome-based redirect policies.
//!
//! A [`RedirectStrategy`] is a pure decision step evaluated after each
//! terminal status: given the status record and the originating error, it
//! decides whether the job should be re-sent and to which queue. Strategies
//! never see mutable listener state.

use crate::jobs::handler::ProcessingError;
use crate::jobs::status::{JobStatus, StatusKind};
use std::fmt;
use std::sync::Arc;

type DeciderFn = dyn Fn(&JobStatus, Option<&ProcessingError>) -> bool + Send + Sync;
type TargetFn = dyn Fn(&JobStatus) -> Option<String> + Send + Sync;

/// Policy that re-routes a job to another queue based on its outcome
///
/// At most one strategy is active per queue id; registering another replaces
/// the previous one.
#[derive(Clone)]
pub struct RedirectStrategy {
    decider: Arc<DeciderFn>,
    target: Arc<TargetFn>,
}

impl RedirectStrategy {
    /// Create a strategy from a decision function and a target-queue function
    pub fn new(
        decider: impl Fn(&JobStatus, Option<&ProcessingError>) -> bool + Send + Sync + 'static,
        target: impl Fn(&JobStatus) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            decider: Arc::new(decider),
            target: Arc::new(target),
        }
    }

    /// Strategy sending failed and timed-out jobs to a fixed queue
    pub fn on_failure(target_queue: impl Into<String>) -> Self {
        let target_queue = target_queue.into();
        Self::new(
            |status, _error| {
                matches!(status.status, StatusKind::Failed | StatusKind::TimedOut)
            },
            move |_status| Some(target_queue.clone()),
        )
    }

    /// Whether the job should be redirected for this outcome
    pub fn decide(&self, status: &JobStatus, error: Option<&ProcessingError>) -> bool {
        (self.decider)(status, error)
    }

    /// Queue to redirect to for this outcome; `None` or blank skips the redirect
    pub fn target_queue(&self, status: &JobStatus) -> Option<String> {
        (self.target)(status)
    }
}

impl fmt::Debug for RedirectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectStrategy").finish_non_exhaustive()
    }
}
