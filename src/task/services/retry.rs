//! Retry and lease policy for the dispatcher.

use std::time::Duration;

/// Bounded exponential backoff keyed on the persisted attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Returns `true` when a task that has started `attempts` attempts may
    /// be retried once more.
    #[must_use]
    pub const fn allows_retry(&self, attempts: u32) -> bool {
        attempts <= self.max_retries
    }

    /// Returns the delay before retrying after attempt number `attempt`.
    ///
    /// The first retry waits `base_delay`; each further retry doubles it, up
    /// to `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1_u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Dispatcher policy: retries plus the processing lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Retry budget and backoff.
    pub retry: RetryPolicy,
    /// How long a `processing` task is considered owned by its worker.
    pub processing_lease: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            processing_lease: Duration::from_secs(600),
        }
    }
}
