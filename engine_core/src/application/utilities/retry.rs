use std::future::Future;
use std::time::Duration;

use pipeline_flow_domain::PipelineError;

/// Explicit retry helper (§9): replaces the source's retry-decorator with a
/// plain function that takes a thunk. No hidden control flow - every call
/// site that needs retry calls this directly.
///
/// Retries `op` up to `max_attempts` total attempts. Delay before attempt
/// `n` (n >= 2) is `initial_delay * multiplier^(n-2)`. Only errors for which
/// [`PipelineError::is_recoverable`] is true are retried; any other error
/// (or exhausting `max_attempts`) is returned immediately.
pub async fn retry<T, F, Fut>(mut op: F, max_attempts: u32, initial_delay: Duration, multiplier: u32) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let mut attempt = 1;
    let mut delay = initial_delay;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_recoverable() => {
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after failure");
                tokio::time::sleep(delay).await;
                delay *= multiplier;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, PipelineError>(42) }
            },
            3,
            Duration::from_millis(1),
            2,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_on_recoverable_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PipelineError> = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PipelineError::io_error("disk full")) }
            },
            3,
            Duration::from_millis(1),
            2,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_immediately_on_non_recoverable_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PipelineError> = retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PipelineError::invalid_config("bad node")) }
            },
            3,
            Duration::from_millis(1),
            2,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
