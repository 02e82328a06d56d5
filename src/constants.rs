//! Pipeline Constants
//!
//! Retry policy, ranking limits and provider defaults shared across services.

/// Total attempts for one batched fetch (first try included)
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Backoff unit in seconds; attempt N waits `RETRY_BASE_DELAY_SECS * N` before retrying
pub const RETRY_BASE_DELAY_SECS: u64 = 5;

/// Default per-attempt HTTP deadline in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default lookback sent to the provider.
/// 10 years comfortably exceeds the 1260 trading days of the 5Y window even with gaps.
pub const DEFAULT_LOOKBACK: &str = "10y";

/// Number of gainers/losers kept per section
pub const TOP_MOVERS_LIMIT: usize = 5;

/// Share of dropped symbols above which a cycle is reported as degraded
pub const DROP_WARN_RATIO: f64 = 0.5;

/// Minimum number of points for a series to yield metrics
pub const MIN_SERIES_POINTS: usize = 2;
