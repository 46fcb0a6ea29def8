//! Timeout and retry decorators for task work.
//!
//! Deadlines and retries belong to the work functions, not to the
//! runner: the runner only sees the final `Result`.

use std::future::Future;
use std::time::Duration;
use storycheck_core::CoreError;

/// Await `future`, failing with [`CoreError::Timeout`] if `timeout`
/// elapses first. The abandoned future is dropped.
pub async fn with_timeout<T, F>(
    timeout: Duration,
    operation: &str,
    future: F,
) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout {
            operation: operation.to_owned(),
            timeout,
        }),
    }
}

/// Run `attempt` up to `max_retries + 1` times, pausing `backoff`
/// between attempts.
///
/// When every attempt fails the final error is wrapped in
/// [`CoreError::RetriesExhausted`] with the attempt count; with
/// `max_retries == 0` the single attempt's error comes back unwrapped.
pub async fn with_retries<T, F, Fut>(
    operation: &str,
    max_retries: u32,
    backoff: Duration,
    mut attempt: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if attempts > max_retries => {
                return Err(if max_retries == 0 {
                    error
                } else {
                    CoreError::RetriesExhausted {
                        operation: operation.to_owned(),
                        attempts,
                        source: Box::new(error),
                    }
                });
            }
            Err(_) => {
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
