//! Exponential backoff settings for API calls.

use std::time::Duration;

use backon::ExponentialBuilder;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// How often and how patiently a retryable failure is retried.
///
/// Delays start at `min_delay` and double up to `max_delay`. `max_attempts`
/// counts the first request, so `1` disables retries; `0` is treated as `1`
/// since a call always sends its request at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Send every request exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Requests a call may send in total, never less than one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_factor(2.0)
            .with_max_times(self.attempts() - 1)
    }
}
