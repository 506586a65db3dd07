use std::fmt::Display;
use std::future::Future;
use tokio::time::sleep;
use tracing::debug;

use super::rpc_errors::RetryPolicy;

/// Run an async operation, retrying every failure after the policy's fixed
/// delay until the attempts are exhausted. The last error is returned and
/// left to the caller to report.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempts = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => match policy.delay_for_retry(attempt) {
                Some(delay) => {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, backing off before retry"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    debug!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %err,
                        "All retry attempts exhausted"
                    );
                    return Err(err);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try_has_no_delay() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = Instant::now();
        let res: Result<u32, String> =
            retry_with_fixed_delay("op", &RetryPolicy::default(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(res, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_after_delay() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = Instant::now();
        let res: Result<u32, String> =
            retry_with_fixed_delay("op", &RetryPolicy::default(), move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("boom".to_string())
                } else {
                    Ok(1)
                }
            })
            .await;

        assert_eq!(res, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_third_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let res: Result<(), String> =
            retry_with_fixed_delay("op", &RetryPolicy::default(), move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {}", n))
            })
            .await;

        assert_eq!(res, Err("failure 1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
