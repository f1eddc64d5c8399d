//! Bounded retry policy applied uniformly per page.
//!
//! One policy object instead of ad hoc counters: max attempts, a fixed
//! pause between attempts, and a per-attempt budget. No unbounded backoff.

use std::time::Duration;

use crate::capability::CapabilityError;
use crate::config::PipelineConfig;

/// Why one attempt failed.
#[derive(Debug)]
pub enum AttemptError {
    /// Configuration error — aborts the whole job immediately, no retry.
    Fatal(CapabilityError),
    /// Transient (timeout, transport blip, malformed payload) — retryable.
    Transient(String),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_page_attempts.max(1),
            attempt_timeout: config.page_timeout,
            backoff: config.retry_backoff,
        }
    }

    /// Run `op` until it succeeds, a fatal error occurs, or attempts are
    /// exhausted. The closure receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, AttemptError>,
    ) -> Result<T, AttemptError> {
        let mut last_transient = String::new();
        for attempt in 1..=self.max_attempts {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(e)) => return Err(AttemptError::Fatal(e)),
                Err(AttemptError::Transient(reason)) => {
                    tracing::debug!(attempt, max = self.max_attempts, %reason, "attempt failed");
                    last_transient = reason;
                    if attempt < self.max_attempts && !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
            }
        }
        Err(AttemptError::Transient(format!(
            "{last_transient} (after {} attempts)",
            self.max_attempts
        )))
    }
}
