//! Ticker normalizer
//!
//! Turns a raw close series into display price, one-day change and
//! historical changes at fixed trading-day offsets. Quote-convention symbols
//! (e.g. EURUSD=X shown as USD/EUR) are inverted before any arithmetic.

use std::collections::HashSet;
use tracing::debug;

use crate::models::{
    percent_change, HistoricalChange, HistoricalWindow, InstrumentMetrics, MarketConfig, PriceSeries,
};

/// Normalizer bound to one configuration's inversion set and window catalogue
pub struct TickerNormalizer<'a> {
    invert: HashSet<&'a str>,
    windows: &'a [HistoricalWindow],
}

impl<'a> TickerNormalizer<'a> {
    pub fn new(invert: &'a [String], windows: &'a [HistoricalWindow]) -> Self {
        Self {
            invert: invert.iter().map(String::as_str).collect(),
            windows,
        }
    }

    pub fn from_config(config: &'a MarketConfig) -> Self {
        Self::new(&config.invert, &config.windows)
    }

    pub fn is_inverted(&self, symbol: &str) -> bool {
        self.invert.contains(symbol)
    }

    /// Metrics for one symbol, or `None` when the series is too short or its
    /// latest close is zero/missing
    pub fn normalize(&self, symbol: &str, series: &PriceSeries) -> Option<InstrumentMetrics> {
        let metrics = normalize_series(series, self.is_inverted(symbol), self.windows);
        if metrics.is_none() {
            debug!(symbol = symbol, points = series.len(), "Insufficient data, skipping symbol");
        }
        metrics
    }
}

/// Reciprocal for inverted symbols; zero stays zero so callers can skip it
fn display_value(raw: f64, inverted: bool) -> f64 {
    if inverted && raw != 0.0 {
        1.0 / raw
    } else {
        raw
    }
}

pub fn normalize_series(
    series: &PriceSeries,
    inverted: bool,
    windows: &[HistoricalWindow],
) -> Option<InstrumentMetrics> {
    if !series.is_usable() {
        return None;
    }

    let current_raw = series.latest()?;
    let prev_raw = series.previous()?;

    let current = display_value(current_raw, inverted);
    let prev = display_value(prev_raw, inverted);
    let change_pct = percent_change(current, prev);

    let len = series.len();
    let historical = windows
        .iter()
        .filter(|w| w.is_available(len))
        .filter_map(|w| {
            let hist = display_value(series.close_back(w.offset)?, inverted);
            percent_change(current, hist).map(|change_pct| HistoricalChange {
                label: w.label.clone(),
                change_pct,
            })
        })
        .collect();

    Some(InstrumentMetrics {
        price: current,
        raw_price: current_raw,
        change_pct,
        historical,
        as_of: series.last_time(),
        fundamentals: None,
    })
}
