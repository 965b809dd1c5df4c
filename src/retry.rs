use std::future::Future;
use std::time::Duration;

use rand::Rng as _;

/// Retry decision returned by the error classifier callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Abort,
}

impl RetryAction {
    pub fn from_retryable(retryable: bool) -> Self {
        if retryable {
            Self::Retry
        } else {
            Self::Abort
        }
    }
}

/// Exponential backoff with jitter, shared by provider fetches and asset
/// downloads so parallel workers hitting the same CDN hiccup don't retry in
/// lockstep.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// No retries and no waiting.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-indexed):
    /// `min(base * 2^retry, max) + jitter(0..base)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp_ms = base_ms.saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let capped = exp_ms.min(self.max_delay.as_millis() as u64);
        let jitter = if base_ms > 0 {
            rand::thread_rng().gen_range(0..base_ms)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }
}

/// Run `operation` until it succeeds, the classifier says `Abort`, or
/// `max_retries` retries have been spent. Returns the last error on failure.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    config: &RetryConfig,
    label: &str,
    classifier: C,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: std::fmt::Display,
{
    let mut retry = 0u32;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if retry >= config.max_retries || classifier(&e) == RetryAction::Abort {
                    return Err(e);
                }
                let delay = config.delay_for_retry(retry);
                tracing::warn!(
                    op = label,
                    attempt = retry + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retryable error, backing off"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
        }
    }
}
