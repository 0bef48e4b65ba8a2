//! Async retry with exponential backoff

use std::future::Future;
use std::time::Duration;

/// Default attempts for collaborator calls
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Run `operation` until it succeeds, fails with a non-retryable error or
/// `max_attempts` is reached
///
/// The delay doubles after each failed attempt. The last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(
    max_attempts: u32,
    base_delay_ms: u64,
    retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= max_attempts || !retryable(&e) {
                    return Err(e);
                }
                let delay = Duration::from_millis(base_delay_ms.saturating_mul(2_u64.pow(attempts - 1)));
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
