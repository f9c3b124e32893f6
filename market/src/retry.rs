use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::feed::PriceFeed;
use crate::types::Pair;

/// Fixed attempt budget with a fixed pause between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// Every error is retryable. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts => {
                    debug!(
                        op = label,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

/// Fetch one price under `policy`; exhaustion becomes `None`.
pub async fn fetch_with_retry<F: PriceFeed + ?Sized>(
    feed: &F,
    pair: &Pair,
    policy: RetryPolicy,
) -> Option<f64> {
    match policy.run(pair.symbol(), || feed.spot_price(pair)).await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(
                pair = %pair,
                attempts = policy.max_attempts,
                error = %e,
                "price fetch failed after retries"
            );
            None
        }
    }
}
