//! Retry with linear backoff.
//!
//! Most storefront requests are never retried: a failure is shown to the
//! user, who may retry explicitly. Uploads to object storage are the
//! exception and go through [`retry_with_backoff`].
//!
//! # Example
//!
//! ```rust
//! use storefront_runtime::retry::{RetryPolicy, retry_with_backoff};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! // 3 attempts, waiting 1s then 2s between them
//! let policy = RetryPolicy::linear(3, Duration::from_secs(1));
//!
//! let url = retry_with_backoff(&policy, "upload_avatar", || async {
//!     Ok::<_, String>("https://storage.test/o/avatar.png")
//! }).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// How many times an operation runs and how long to wait in between.
///
/// After the n-th failed attempt the operation waits `step × n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay unit; grows by one step per failed attempt
    pub step: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, 1s then 2s apart
    fn default() -> Self {
        Self::linear(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Linear backoff: waits `step × n` after the n-th failed attempt.
    #[must_use]
    pub const fn linear(max_attempts: u32, step: Duration) -> Self {
        Self { max_attempts, step }
    }

    /// Delay to wait after `failed_attempts` attempts have failed (1-indexed).
    #[must_use]
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        self.step.saturating_mul(failed_attempts.max(1))
    }

    /// Whether another attempt is allowed after `failed_attempts` failures.
    #[must_use]
    pub const fn should_retry(&self, failed_attempts: u32) -> bool {
        failed_attempts < self.max_attempts
    }
}

/// Retry an async operation according to `policy`.
///
/// The operation runs at most `max_attempts` times, sequentially. Attempts
/// are logged and counted under the `operation` label.
///
/// # Errors
///
/// Returns the error of the last attempt once the attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failed_attempts = 0;

    loop {
        let error = match f().await {
            Ok(result) => {
                if failed_attempts > 0 {
                    metrics::counter!("retry.success", "operation" => operation.to_string())
                        .increment(1);
                    tracing::info!(operation, failed_attempts, "succeeded after retry");
                }
                return Ok(result);
            },
            Err(error) => error,
        };

        failed_attempts += 1;
        if !policy.should_retry(failed_attempts) {
            metrics::counter!("retry.exhausted", "operation" => operation.to_string()).increment(1);
            tracing::error!(operation, attempts = failed_attempts, %error, "giving up");
            return Err(error);
        }

        let delay = policy.delay_after(failed_attempts);
        metrics::counter!("retry.attempt", "operation" => operation.to_string()).increment(1);
        tracing::warn!(
            operation,
            attempt = failed_attempts,
            delay_ms = delay.as_millis(),
            %error,
            "attempt failed, retrying"
        );
        sleep(delay).await;
    }
}
