// Retry with exponential backoff

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one; zero disables retrying
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// base, 2×base, 4×base ... capped at 32×base
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        self.base_delay * 2u32.pow(exponent)
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry` rejects,
/// or the policy's retries are spent.
pub async fn with_retry<'a, F, T, E, P>(
    mut operation: F,
    policy: RetryPolicy,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> BoxFuture<'a, Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                attempt += 1;
                if attempt > policy.max_retries || !should_retry(&error) {
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Retrying after transient failure");
                sleep(delay).await;
            }
        }
    }
}
