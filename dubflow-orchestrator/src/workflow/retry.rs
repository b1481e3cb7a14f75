//! Submission retry policy
//!
//! Bounded exponential backoff for transient provider errors. Validation
//! errors and provider-reported failures are surfaced immediately; only
//! errors classified retryable consume attempts.

use std::future::Future;
use tokio::time::{self, Duration};
use tracing::warn;

use crate::config::Config;
use crate::workflow::error::WorkflowError;

/// Retry attempts and backoff base
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.submit_max_attempts,
            base_delay: config.submit_backoff,
        }
    }
}

/// Runs `op` until it succeeds, a non-retryable error occurs, or the
/// attempt ceiling is reached (the last error is returned).
///
/// The closure is invoked once per attempt; callers that need a fresh
/// operation identifier per attempt generate it inside the closure.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.pow(attempt - 1);
            time::sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                warn!(
                    "Attempt {}/{} failed: {}",
                    attempt + 1,
                    policy.max_attempts,
                    e
                );
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        WorkflowError::TransientProvider("retry ceiling reached with no attempts".to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let value = retry_with_backoff(&policy(5), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(WorkflowError::TransientProvider("503".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_errors_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let err = retry_with_backoff::<u32, _, _>(&policy(5), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WorkflowError::Validation("UnsupportedLocale".to_string()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_ceiling_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let err = retry_with_backoff::<u32, _, _>(&policy(3), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(WorkflowError::TransientProvider(format!("attempt {}", n)))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            WorkflowError::TransientProvider(msg) => assert_eq!(msg, "attempt 3"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
