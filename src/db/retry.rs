//! Bounded-attempt retry for schema initialization.
//!
//! Deliberately simple: a fixed delay between attempts, no backoff and no
//! jitter. This is tuned for container-orchestration startup races where the
//! database becomes ready within a bounded, roughly-known window. There is no
//! cancellation; once started the loop runs to success or exhaustion.

use std::future::Future;
use std::time::Duration;

use crate::db::DbError;

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Retry budget for one `initialize` call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, inclusive. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed pause between failed attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy without any waiting, for tests and eager local runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between failures.
///
/// Intermediate errors are swallowed and logged with their attempt index;
/// the final attempt's error propagates untouched.
pub async fn with_retries<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        tracing::debug!(label, attempt, max_attempts, "attempting");
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(label, attempt, "succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                tracing::error!(label, attempt, error = %err, "giving up after retries");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    error = %err,
                    delay_ms = policy.delay.as_millis() as u64,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = with_retries(RetryPolicy::immediate(3), "test", move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(DbError::Connection(format!("not ready ({n})")))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_propagates_final_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), DbError> =
            with_retries(RetryPolicy::immediate(3), "test", move || {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(DbError::Connection(format!("attempt {n} failed")))
                }
            })
            .await;

        // All 3 attempts are consumed, and the error is the last one raised.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DbError::Connection(msg)) => assert_eq!(msg, "attempt 3 failed"),
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = with_retries(RetryPolicy::immediate(5), "test", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_clamps_to_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), DbError> =
            with_retries(RetryPolicy::immediate(0), "test", move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(DbError::Query("boom".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
