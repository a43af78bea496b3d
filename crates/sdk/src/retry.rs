// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Tells [`retry_with_backoff`] whether an error is worth another attempt
pub enum RetryError<E> {
    /// Give up and hand the error to the caller
    Failure(E),
    /// Try again after the backoff delay
    Retry(E),
}

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - Async function to retry
/// * `max_attempts` - Maximum number of attempts, including the first one
/// * `base_delay_ms` - Delay before the second attempt. Attempt `n` (zero based) that fails waits
///   `base_delay_ms * 2^n` before the next one.
///
/// # Returns
/// The first successful value, or the last error once attempts are exhausted or the operation
/// reports a [`RetryError::Failure`]
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    max_attempts: u32,
    base_delay_ms: u64,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RetryError<E>>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    let mut delay_ms = base_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Failure(e)) => return Err(e),
            Err(RetryError::Retry(e)) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    attempt, max_attempts, delay_ms, e
                );

                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = delay_ms.saturating_mul(2);
            }
        }
    }
}

/// Retry an sdk operation, backing off only on transient errors.
///
/// Terminal errors such as validation failures are returned straight away.
pub async fn retry<F, Fut, T>(operation: F, max_attempts: u32, base_delay_ms: u64) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut operation = operation;
    retry_with_backoff(
        || {
            let fut = operation();
            async move {
                fut.await.map_err(|e| {
                    if e.is_retryable() {
                        RetryError::Retry(e)
                    } else {
                        RetryError::Failure(e)
                    }
                })
            }
        },
        max_attempts,
        base_delay_ms,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(SdkError::Timeout("gateway".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            },
            3,
            1,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = retry(
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err(SdkError::Timeout(format!("attempt {}", n)))
                }
            },
            3,
            1,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "Timed out: attempt 2");
    }

    #[tokio::test]
    async fn test_terminal_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = retry(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SdkError::validation("value exceeds uint8 maximum"))
                }
            },
            5,
            1,
        )
        .await;

        assert!(matches!(result, Err(SdkError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backoff_doubles() {
        let start = Instant::now();
        let result: std::result::Result<(), String> = retry_with_backoff(
            || async { Err(RetryError::Retry("nope".to_string())) },
            3,
            20,
        )
        .await;

        // 20ms after the first attempt and 40ms after the second
        assert!(result.is_err());
        assert!(start.elapsed().as_millis() >= 60);
    }
}
