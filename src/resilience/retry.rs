use tokio::time::{sleep, Duration};
use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::config::settings::RetryConfig;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 1000;

/// Exponential backoff: the delay doubles after every failed attempt, capped at `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn from_config(retry: Option<&RetryConfig>) -> Self {
        Self {
            attempts: retry.and_then(|r| r.attempts).unwrap_or(DEFAULT_ATTEMPTS),
            base_delay_ms: retry.and_then(|r| r.base_delay_ms).unwrap_or(DEFAULT_BASE_DELAY_MS),
            max_delay_ms: retry.and_then(|r| r.max_delay_ms).unwrap_or(DEFAULT_MAX_DELAY_MS),
        }
    }

    pub async fn run_with_retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.run_with_retry_if(operation, |_| true).await
    }

    /// Like [`run_with_retry`](Self::run_with_retry), but an error for which
    /// `is_retryable` returns false is returned at once.
    pub async fn run_with_retry_if<F, Fut, T, P>(&self, mut operation: F, is_retryable: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
        P: Fn(&anyhow::Error) -> bool,
    {
        if self.attempts == 0 {
            bail!("retry policy allows no attempts");
        }
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts && is_retryable(&e) => {
                    warn!("Attempt {attempt}/{} failed: {e}", self.attempts);
                    sleep(Duration::from_millis(delay)).await;
                    delay = next_delay(delay, self.max_delay_ms);
                    attempt += 1;
                }
                Err(e) => {
                    debug!("giving up after attempt {attempt}: {e}");
                    return Err(e);
                }
            }
        }
    }
}

fn next_delay(delay: u64, max_delay_ms: u64) -> u64 {
    delay.saturating_mul(2).min(max_delay_ms)
}
