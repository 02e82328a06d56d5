mod price_series;
mod window;
mod metrics;
pub mod market_config;

pub use price_series::{is_valid_close, BatchDataset, PricePoint, PriceSeries};
pub use window::{default_windows, HistoricalWindow};
pub use metrics::{percent_change, Fundamentals, HistoricalChange, InstrumentMetrics, MetricsMap};
pub use market_config::{CrossRateDefinition, MarketConfig, Section, TickerEntry, View, ViewConfig};
