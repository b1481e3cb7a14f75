//! Polling scheduler
//!
//! Repeatedly queries a provider operation until it reaches a terminal
//! status or the total wait ceiling elapses. Each poll is a single
//! idempotent read; the fetch closure is also responsible for bumping the
//! job's updated_at timestamp.

use std::future::Future;
use tokio::time::{self, Duration, Instant};
use tracing::warn;

use crate::config::Config;
use crate::providers::RemoteStatus;
use crate::workflow::error::WorkflowError;

/// Consecutive failed reads tolerated before the poll loop gives up.
const MAX_CONSECUTIVE_POLL_ERRORS: u32 = 5;

/// Polling cadence and ceiling
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Interval before the first re-poll.
    pub initial_interval: Duration,
    /// Upper bound on the backed-off interval.
    pub max_interval: Duration,
    /// Total wait ceiling; exceeding it is a PollingTimeout.
    pub max_wait: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_interval: config.poll_interval,
            max_interval: config.poll_max_interval,
            max_wait: config.poll_max_wait,
        }
    }
}

/// Terminal outcome of a poll loop
#[derive(Debug)]
pub enum PollOutcome<S> {
    /// The provider reported "succeeded"; carries the final payload.
    Succeeded(S),
    /// The provider reported "failed"; carries its error message.
    Failed(String),
}

/// Polls `fetch` until the returned status is terminal.
///
/// The interval doubles after every poll up to `max_interval`. No poll is
/// issued past the wait ceiling: once the next sleep would cross it, the
/// loop surfaces `PollingTimeout` instead, which is distinct from a
/// provider-reported failure.
pub async fn poll_until_terminal<S, F, Fut>(
    policy: &PollPolicy,
    mut fetch: F,
) -> Result<PollOutcome<S>, WorkflowError>
where
    S: RemoteStatus,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, WorkflowError>>,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval;
    let mut consecutive_errors = 0u32;

    loop {
        match fetch().await {
            Ok(status) if status.is_terminal() => {
                if status.is_succeeded() {
                    return Ok(PollOutcome::Succeeded(status));
                }
                let message = status
                    .failure_message()
                    .unwrap_or("provider reported failure without a message")
                    .to_string();
                return Ok(PollOutcome::Failed(message));
            }
            Ok(_) => {
                consecutive_errors = 0;
            }
            Err(e) if e.is_retryable() && consecutive_errors < MAX_CONSECUTIVE_POLL_ERRORS => {
                consecutive_errors += 1;
                warn!(
                    "Status poll failed ({} consecutive): {}",
                    consecutive_errors, e
                );
            }
            Err(e) => return Err(e),
        }

        if started.elapsed() + interval > policy.max_wait {
            return Err(WorkflowError::PollingTimeout(policy.max_wait.as_secs()));
        }

        time::sleep(interval).await;
        interval = (interval * 2).min(policy.max_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::OperationStatus;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_wait_secs: u64) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            max_wait: Duration::from_secs(max_wait_secs),
        }
    }

    fn status(s: &str) -> OperationStatus {
        OperationStatus {
            status: s.to_string(),
            error: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_terminal_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let outcome = poll_until_terminal(&policy(3600), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(if n < 2 {
                    status("running")
                } else {
                    status("succeeded")
                })
            }
        })
        .await
        .unwrap();

        assert!(matches!(outcome, PollOutcome::Succeeded(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_not_a_timeout() {
        let outcome = poll_until_terminal(&policy(3600), || async {
            Ok(OperationStatus {
                status: "failed".to_string(),
                error: Some("unsupported codec".to_string()),
            })
        })
        .await
        .unwrap();

        match outcome {
            PollOutcome::Failed(msg) => assert_eq!(msg, "unsupported codec"),
            other => panic!("expected provider failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_exceeded_is_polling_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        // Intervals 5, 10, 20 put the next poll past the 30s ceiling.
        let err = poll_until_terminal(&policy(30), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(status("running"))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WorkflowError::PollingTimeout(30)));
        // Polls at t=0, 5, 15; the next poll would land at t=35 and is
        // never issued.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_read_errors_are_tolerated() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let outcome = poll_until_terminal(&policy(3600), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(WorkflowError::TransientProvider("502".to_string()))
                } else {
                    Ok(status("succeeded"))
                }
            }
        })
        .await
        .unwrap();

        assert!(matches!(outcome, PollOutcome::Succeeded(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonterminal_statuses_keep_polling() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        // "notStarted" and "running" are transient; only the exact strings
        // "succeeded" and "failed" are terminal.
        let outcome = poll_until_terminal(&policy(3600), move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(match n {
                    0 => status("notStarted"),
                    1 => status("running"),
                    _ => status("succeeded"),
                })
            }
        })
        .await
        .unwrap();

        assert!(matches!(outcome, PollOutcome::Succeeded(_)));
    }
}
