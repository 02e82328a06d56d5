use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Percent change over one historical window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalChange {
    pub label: String,
    pub change_pct: f64,
}

/// Valuation and analyst fields some providers attach to a quote.
/// Every field is optional; indices and currencies usually have none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub pe_trailing: Option<f64>,
    pub pe_forward: Option<f64>,
    /// Analyst price targets
    pub target_low: Option<f64>,
    pub target_mean: Option<f64>,
    pub target_high: Option<f64>,
    /// Upper-cased analyst recommendation key, e.g. "BUY", "STRONG_BUY"
    pub recommendation: Option<String>,
}

impl Fundamentals {
    pub fn is_empty(&self) -> bool {
        self == &Fundamentals::default()
    }
}

/// Snapshot for one symbol or cross rate, computed once per fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMetrics {
    /// Display price (inverted for quote-convention symbols)
    pub price: f64,

    /// Latest close as reported by the provider, before inversion
    pub raw_price: f64,

    /// Change vs the previous close; `None` when the previous close was unusable
    pub change_pct: Option<f64>,

    /// Changes for the windows the series covers, in catalogue order
    pub historical: Vec<HistoricalChange>,

    /// Time of the latest point used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundamentals: Option<Fundamentals>,
}

impl InstrumentMetrics {
    /// Change for a window label, if the window was available
    pub fn historical_change(&self, label: &str) -> Option<f64> {
        self.historical
            .iter()
            .find(|h| h.label == label)
            .map(|h| h.change_pct)
    }

    /// Copy with fundamentals attached
    pub fn with_fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        if !fundamentals.is_empty() {
            self.fundamentals = Some(fundamentals);
        }
        self
    }
}

/// Percent change from `from` to `to`; `None` when `from` cannot be divided by
pub fn percent_change(to: f64, from: f64) -> Option<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// Metrics keyed by symbol or cross-rate name
pub type MetricsMap = HashMap<String, InstrumentMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(110.0, 100.0), Some(10.0));
        assert_eq!(percent_change(90.0, 100.0), Some(-10.0));
        assert_eq!(percent_change(1.0, 0.0), None);
        assert_eq!(percent_change(f64::INFINITY, 1.0), None);
    }

    #[test]
    fn test_empty_fundamentals_not_attached() {
        let metrics = InstrumentMetrics {
            price: 1.0,
            raw_price: 1.0,
            change_pct: None,
            historical: vec![HistoricalChange { label: "1W".into(), change_pct: 2.0 }],
            as_of: None,
            fundamentals: None,
        };

        assert_eq!(metrics.historical_change("1W"), Some(2.0));
        assert_eq!(metrics.historical_change("5Y"), None);

        let unchanged = metrics.clone().with_fundamentals(Fundamentals::default());
        assert!(unchanged.fundamentals.is_none());

        let enriched = metrics.with_fundamentals(Fundamentals {
            pe_trailing: Some(21.5),
            ..Fundamentals::default()
        });
        assert_eq!(enriched.fundamentals.and_then(|f| f.pe_trailing), Some(21.5));
    }
}
