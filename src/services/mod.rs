pub mod batch_fetcher;
pub mod cross_rate;
pub mod normalizer;
pub mod overview;
pub mod provider;
pub mod ranking;
pub mod yahoo;

pub use batch_fetcher::{BatchFetcher, RetryPolicy};
pub use cross_rate::{synthesize, synthesize_from};
pub use normalizer::{normalize_series, TickerNormalizer};
pub use overview::{build_metrics, CycleReport, MarketOverview};
pub use provider::PriceProvider;
pub use ranking::{rank, rank_entries, Mover, RankedSummary, SectionMovers, ALL_SECTIONS};
pub use yahoo::YahooClient;
