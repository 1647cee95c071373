//! Retry with exponential backoff
//!
//! Used by the notification worker in the cloud service and by the admin
//! client for order cancellation. Each attempt runs under its own timeout;
//! dropping the attempt future aborts the in-flight call.

use std::future::Future;
use std::time::Duration;

/// Default attempt count
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
/// Default backoff multiplier
pub const DEFAULT_FACTOR: f64 = 1.5;
/// Default per-attempt timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of an exhausted or aborted retry loop
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The last attempt did not finish within `attempt_timeout`
    #[error("attempt {attempt} timed out after {timeout:?}")]
    Timeout { attempt: u32, timeout: Duration },
    /// The last attempt failed (or failed with a non-retryable error)
    #[error("{0}")]
    Failed(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Failed(e) => Some(e),
            RetryError::Timeout { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::Timeout { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            factor: DEFAULT_FACTOR,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (0-based): `base × factor^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        self.base_delay.mul_f64(self.factor.powi(exp))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// `max_attempts` is reached. Timeouts are always retryable.
    pub async fn run<T, E, F, Fut, R>(&self, mut op: F, is_retryable: R) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let err = match tokio::time::timeout(self.attempt_timeout, op(attempt)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    if !is_retryable(&e) {
                        return Err(RetryError::Failed(e));
                    }
                    RetryError::Failed(e)
                }
                Err(_) => RetryError::Timeout {
                    attempt,
                    timeout: self.attempt_timeout,
                },
            };

            if attempt + 1 >= max_attempts {
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after failure");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
