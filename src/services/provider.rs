//! Price provider seam
//!
//! The pipeline talks to market data sources only through [`PriceProvider`],
//! so the retrying fetcher can be exercised against in-memory stubs.

use std::collections::HashMap;
use std::future::Future;

use crate::error::ProviderError;
use crate::models::{BatchDataset, Fundamentals};

pub trait PriceProvider {
    /// One batched time-series request for all `symbols` covering `lookback`
    /// (e.g. "10y"). Symbols the provider does not know are left out of the
    /// dataset rather than failing the batch.
    fn fetch_batch(
        &self,
        symbols: &[String],
        lookback: &str,
    ) -> impl Future<Output = Result<BatchDataset, ProviderError>> + Send;

    /// Valuation fields for `symbols`, best effort. Providers without such
    /// data keep the default empty answer.
    fn fetch_fundamentals(
        &self,
        _symbols: &[String],
    ) -> impl Future<Output = Result<HashMap<String, Fundamentals>, ProviderError>> + Send {
        async { Ok(HashMap::new()) }
    }
}
