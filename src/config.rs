use crate::error::{DispatchError, Result};
use std::time::Duration;

/// Configuration values shared by a `JobQueueListener`
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Milliseconds before an in-flight job is canceled and reported as
    /// timed out. Zero means unbounded.
    pub job_timeout_ms: u64,
    /// Prefix applied to the physical transport queue identifiers created
    /// for handlers. Routing always uses the unprefixed queue id.
    pub queue_prefix: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            job_timeout_ms: 0,
            queue_prefix: None,
        }
    }
}

impl ListenerConfig {
    /// Build a configuration from `DISPATCHQ_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("DISPATCHQ_JOB_TIMEOUT_MS") {
            config.job_timeout_ms = timeout.parse().map_err(|e| {
                DispatchError::configuration(format!("invalid job_timeout_ms: {e}"))
            })?;
        }

        if let Ok(prefix) = std::env::var("DISPATCHQ_QUEUE_PREFIX") {
            if !prefix.is_empty() {
                config.queue_prefix = Some(prefix);
            }
        }

        Ok(config)
    }

    /// Job timeout as a `Duration`, or `None` when unbounded
    pub fn job_timeout(&self) -> Option<Duration> {
        if self.job_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.job_timeout_ms))
        }
    }
}
