//! Retrying batch fetcher
//!
//! Issues one batched request per attempt and retries only throttled
//! attempts, waiting `base_delay * attempt` between them. Any other failure
//! ends the fetch immediately. Attempts are strictly sequential.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::constants::{MAX_FETCH_ATTEMPTS, RETRY_BASE_DELAY_SECS};
use crate::error::FetchError;
use crate::models::BatchDataset;
use crate::services::provider::PriceProvider;

/// Attempt budget and linear backoff unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_FETCH_ATTEMPTS,
            base_delay: Duration::from_secs(RETRY_BASE_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Upper bound on time spent sleeping across a whole fetch
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|a| self.delay_after(a)).sum()
    }
}

pub struct BatchFetcher<P> {
    provider: P,
    policy: RetryPolicy,
}

impl<P: PriceProvider> BatchFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self::with_policy(provider, RetryPolicy::default())
    }

    pub fn with_policy(provider: P, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch close series for `symbols`. Duplicates are collapsed before the
    /// request. An empty answer counts as a failure.
    pub async fn fetch(&self, symbols: &[String], lookback: &str) -> Result<BatchDataset, FetchError> {
        let mut symbols = symbols.to_vec();
        symbols.sort();
        symbols.dedup();

        if symbols.is_empty() {
            return Err(FetchError::NoSymbols);
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                symbols_count = symbols.len(),
                lookback = lookback,
                "Requesting price batch"
            );

            match self.provider.fetch_batch(&symbols, lookback).await {
                Ok(dataset) => {
                    if dataset.is_empty() {
                        error!(attempt = attempt, "Provider returned an empty batch");
                        return Err(FetchError::Empty);
                    }
                    info!(
                        attempt = attempt,
                        requested = symbols.len(),
                        received = dataset.len(),
                        "Price batch fetched"
                    );
                    return Ok(dataset);
                }
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        error!(attempts = attempt, error = %e, "Rate limit exceeded, giving up");
                        return Err(FetchError::Exhausted { attempts: attempt, last: e });
                    }
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Rate limited. Waiting {}s before retry",
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempt = attempt, error = %e, "Error fetching price batch");
                    return Err(FetchError::Provider(e));
                }
            }
        }
    }
}
