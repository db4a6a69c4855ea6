//! Retry policy with exponential backoff.

use std::time::Duration;

use tracing::warn;

use crate::foundation::error::{NewsreelError, NewsreelResult};

/// Exponential backoff policy for fetch operations.
///
/// Attempt `n` (0-based) that fails with a fetch error sleeps for
/// `min(base_delay * 2^n, max_delay)` before the next attempt. With the defaults
/// an operation is attempted up to four times with delays of 1s, 2s and 4s.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Retry only fetch errors flagged transient (timeouts, connect errors, 5xx, 429).
    pub transient_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            transient_only: false,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Whether this policy retries after `err`.
    pub fn should_retry(&self, err: &NewsreelError) -> bool {
        matches!(err, NewsreelError::Fetch { .. }) && (!self.transient_only || err.is_retryable())
    }

    /// Run `op` until it succeeds, fails with an error [`Self::should_retry`] rejects, or
    /// retries run out.
    pub fn run<T>(
        &self,
        operation: &str,
        op: impl FnMut() -> NewsreelResult<T>,
    ) -> NewsreelResult<T> {
        self.run_if(operation, |e| self.should_retry(e), op)
    }

    /// Like [`Self::run`], with the caller deciding which errors are retried.
    pub fn run_if<T>(
        &self,
        operation: &str,
        retry_on: impl Fn(&NewsreelError) -> bool,
        op: impl FnMut() -> NewsreelResult<T>,
    ) -> NewsreelResult<T> {
        self.run_with_sleep(operation, retry_on, op, std::thread::sleep)
    }

    pub(crate) fn run_with_sleep<T>(
        &self,
        operation: &str,
        retry_on: impl Fn(&NewsreelError) -> bool,
        mut op: impl FnMut() -> NewsreelResult<T>,
        mut sleep: impl FnMut(Duration),
    ) -> NewsreelResult<T> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && retry_on(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "operation failed, retrying: {e}"
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/retry.rs"]
mod tests;
