//! Bounded retry policy for provider resources
//!
//! Both the recognition gateway and the AI stream adapter recreate their
//! underlying provider streams on failure. That behavior lives here as one
//! explicit policy object instead of being scattered across the adapters.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retries a fallible async operation a bounded number of times with a
/// fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `op`, retrying on failure up to `max_retries` additional attempts.
    /// The final error is returned once the budget is exhausted.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        "operation failed, retrying after delay"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}
