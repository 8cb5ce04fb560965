//! Retry-with-backoff combinator.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, the successful or final one included.
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or the
/// policy's retries run out. Between attempts the combinator sleeps for the backoff.
///
/// `op` receives the caller's state and the 1-based attempt number, so it can rebuild
/// whatever a failed attempt broke before trying again.
pub async fn retry_with<S, T, E, R, F>(
    state: &mut S,
    policy: &RetryPolicy,
    is_retryable: R,
    mut op: F,
) -> RetryOutcome<T, E>
where
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    F: for<'a> FnMut(&'a mut S, u32) -> BoxFuture<'a, Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op(state, attempt).await {
            Err(err) if attempt <= policy.max_retries && is_retryable(&err) => {
                warn!(
                    target: "scheduler",
                    attempt,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %err,
                    "retrying after failure"
                );
                tokio::time::sleep(policy.backoff).await;
            }
            result => {
                return RetryOutcome {
                    result,
                    attempts: attempt,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    struct Flaky {
        failures: u32,
        calls: Vec<u32>,
    }

    fn flaky_op(state: &mut Flaky, attempt: u32) -> BoxFuture<'_, Result<u32, String>> {
        async move {
            state.calls.push(attempt);
            if state.failures > 0 {
                state.failures -= 1;
                Err("closed".to_string())
            } else {
                Ok(attempt)
            }
        }
        .boxed()
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let mut state = Flaky {
            failures: 2,
            calls: vec![],
        };
        let policy = RetryPolicy::new(2, Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        let outcome = retry_with(&mut state, &policy, |_| true, flaky_op).await;
        assert_eq!(outcome.result, Ok(3));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(state.calls, vec![1, 2, 3]);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_when_retries_run_out() {
        let mut state = Flaky {
            failures: 5,
            calls: vec![],
        };
        let policy = RetryPolicy::new(1, Duration::from_millis(10));
        let outcome = retry_with(&mut state, &policy, |_| true, flaky_op).await;
        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_stop_at_once() {
        let mut state = Flaky {
            failures: 5,
            calls: vec![],
        };
        let outcome = retry_with(
            &mut state,
            &RetryPolicy::new(3, Duration::ZERO),
            |err: &String| err != "closed",
            flaky_op,
        )
        .await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(state.calls, vec![1]);
    }
}
