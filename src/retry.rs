//! Retry wrapper for flaky upstream calls.
//!
//! Provider endpoints drop connections and time out routinely, so every
//! network step runs through [`RetryPolicy::execute`]: bounded attempts with
//! a linear backoff (`base_delay * attempt_number`). Errors that a retry
//! cannot fix (wrong password, changed page layout, explicit upstream
//! rejection) propagate immediately, see [`ResolveError::is_retryable`].

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ResolveError;

/// Default maximum attempts (including the initial attempt).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Bounded-attempt retry schedule with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings. `max_attempts` is clamped to
    /// at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the configured maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following failed attempt `attempt` (1-indexed).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `operation` until it succeeds, fails terminally, or attempts are
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first terminal error unchanged, or the last retryable
    /// error once `max_attempts` invocations have all failed.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, ResolveError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if attempt >= self.max_attempts {
                        warn!(attempt, error = %err, "retry attempts exhausted");
                        return Err(err);
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "attempt failed; will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
