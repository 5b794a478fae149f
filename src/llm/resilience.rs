//! Bounded retry with linear backoff for external LLM calls.
//!
//! After failed attempt `n` (1-based) the loop waits `2 × n` backoff units
//! before the next attempt. No wait follows the final attempt; its error is
//! returned to the caller.

use crate::{Error, Result};
use std::time::{Duration, Instant};

/// Retry configuration for LLM calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// One backoff unit.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy, clamping `max_attempts` to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt.saturating_mul(2))
    }
}

/// Something that can block the current thread for a duration.
///
/// Injected into retry loops so tests can observe delays without waiting.
pub trait Sleeper: Send + Sync {
    /// Blocks for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Runs `call` until it succeeds or the policy's attempts are exhausted.
///
/// `call` receives the 1-based attempt number. Every failure is retried;
/// callers map non-retryable conditions before reaching this loop.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub fn retry_with_backoff<T, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    operation: &'static str,
    mut call: F,
) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let start = Instant::now();
        match call(attempt) {
            Ok(value) => {
                record_attempt(operation, "success", start);
                return Ok(value);
            },
            Err(err) => {
                let status = if is_timeout_error(&err) {
                    "timeout"
                } else {
                    "error"
                };
                record_attempt(operation, status, start);

                if attempt < max_attempts {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    metrics::counter!("llm_retries_total", "operation" => operation).increment(1);
                    sleeper.sleep(delay);
                } else {
                    tracing::warn!(operation, attempt, error = %err, "Final attempt failed");
                }
                last_error = Some(err);
            },
        }
    }

    Err(last_error.unwrap_or_else(|| Error::OperationFailed {
        operation: operation.to_string(),
        cause: "exhausted retries".to_string(),
    }))
}

fn record_attempt(operation: &'static str, status: &'static str, start: Instant) {
    metrics::counter!(
        "llm_requests_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "llm_request_duration_ms",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Returns true when the error looks like a transport timeout.
#[must_use]
pub fn is_timeout_error(err: &Error) -> bool {
    match err {
        Error::OperationFailed { cause, .. } => {
            let lower = cause.to_lowercase();
            lower.contains("timeout")
                || lower.contains("timed out")
                || lower.contains("deadline")
                || lower.contains("elapsed")
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.delays.lock().expect("lock").push(duration);
        }
    }

    fn failure(n: u32) -> Error {
        Error::OperationFailed {
            operation: "test".to_string(),
            cause: format!("failure {n}"),
        }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(6));
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        let mut calls = 0;

        let result: Result<()> = retry_with_backoff(&policy, &sleeper, "test", |attempt| {
            calls += 1;
            Err(failure(attempt))
        });

        assert_eq!(calls, 4);
        assert!(matches!(result, Err(Error::OperationFailed { cause, .. }) if cause == "failure 4"));
        assert_eq!(
            *sleeper.delays.lock().expect("lock"),
            vec![
                Duration::from_millis(20),
                Duration::from_millis(40),
                Duration::from_millis(60)
            ]
        );
    }

    #[test]
    fn test_success_after_retry() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();

        let result = retry_with_backoff(&policy, &sleeper, "test", |attempt| {
            if attempt < 2 { Err(failure(attempt)) } else { Ok(attempt) }
        });

        assert_eq!(result.expect("success"), 2);
        assert_eq!(sleeper.delays.lock().expect("lock").len(), 1);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_is_timeout_error() {
        let timeout = Error::OperationFailed {
            operation: "openai_request".to_string(),
            cause: "operation timed out".to_string(),
        };
        assert!(is_timeout_error(&timeout));
        assert!(!is_timeout_error(&failure(1)));
        assert!(!is_timeout_error(&Error::Cancelled));
    }
}
