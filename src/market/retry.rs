use std::future::Future;
use std::time::Duration;

use log::warn;

use super::error::MarketDataError;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt grows linearly with the attempt number.
    fn delay_for(&self, attempt: u32) -> Duration {
        std::cmp::min(self.base_delay * attempt, self.max_delay)
    }

    /// Run `operation` until it succeeds, exhausts the attempt ceiling, or
    /// fails with a non-retryable error.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, MarketDataError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !error.is_retryable() || attempts >= self.max_attempts {
                        return Err(error);
                    }

                    let delay = self.delay_for(attempts);
                    warn!(
                        "provider call failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempts, self.max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
