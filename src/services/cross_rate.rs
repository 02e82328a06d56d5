//! Cross-rate synthesizer
//!
//! Prices a synthetic pair as `base / quote` from two raw series, e.g.
//! SGD/INR = USDINR / USDSGD. History is aligned by position: both series
//! are read at `min_len - 1 - offset`, which assumes they follow the same
//! trading calendar.

use tracing::debug;

use crate::models::{
    is_valid_close, percent_change, CrossRateDefinition, HistoricalChange, HistoricalWindow,
    InstrumentMetrics, PriceSeries,
};

/// Metrics for `definition`, or `None` when either raw series is unusable
pub fn synthesize(
    definition: &CrossRateDefinition,
    base: &PriceSeries,
    quote: &PriceSeries,
    windows: &[HistoricalWindow],
) -> Option<InstrumentMetrics> {
    if !base.is_usable() || !quote.is_usable() {
        debug!(
            cross_rate = definition.name.as_str(),
            base_points = base.len(),
            quote_points = quote.len(),
            "Cross-rate inputs unusable, skipping"
        );
        return None;
    }

    let current = base.latest()? / quote.latest()?;
    if !is_valid_close(current) {
        return None;
    }

    let change_pct = match (base.previous(), quote.previous()) {
        (Some(b), Some(q)) if is_valid_close(q) => percent_change(current, b / q),
        _ => None,
    };

    let usable_len = base.len().min(quote.len());
    let historical = windows
        .iter()
        .filter(|w| w.is_available(usable_len))
        .filter_map(|w| {
            let idx = usable_len - 1 - w.offset;
            let b = base.close_at(idx)?;
            let q = quote.close_at(idx)?;
            if !is_valid_close(q) {
                return None;
            }
            percent_change(current, b / q).map(|change_pct| HistoricalChange {
                label: w.label.clone(),
                change_pct,
            })
        })
        .collect();

    let as_of = match (base.last_time(), quote.last_time()) {
        (Some(b), Some(q)) => Some(b.min(q)),
        _ => None,
    };

    Some(InstrumentMetrics {
        price: current,
        raw_price: current,
        change_pct,
        historical,
        as_of,
        fundamentals: None,
    })
}

/// Synthesize from whichever raw series are present; missing dependencies yield `None`
pub fn synthesize_from<'a>(
    definition: &CrossRateDefinition,
    lookup: impl Fn(&str) -> Option<&'a PriceSeries>,
    windows: &[HistoricalWindow],
) -> Option<InstrumentMetrics> {
    let (Some(base), Some(quote)) = (lookup(&definition.base), lookup(&definition.quote)) else {
        debug!(
            cross_rate = definition.name.as_str(),
            base = definition.base.as_str(),
            quote = definition.quote.as_str(),
            "Cross-rate dependency missing, skipping"
        );
        return None;
    };
    synthesize(definition, base, quote, windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_windows, BatchDataset};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sgd_inr() -> CrossRateDefinition {
        CrossRateDefinition::new("SGD/INR", "USDINR=X", "USDSGD=X")
    }

    #[test]
    fn test_basic_cross_rate() {
        let base = PriceSeries::from_closes(&[10.0, 12.0]);
        let quote = PriceSeries::from_closes(&[2.0, 3.0]);
        let metrics = synthesize(&sgd_inr(), &base, &quote, &default_windows()).unwrap();

        assert!(approx(metrics.price, 4.0));
        assert!(approx(metrics.change_pct.unwrap(), -20.0));
        assert!(metrics.historical.is_empty());
    }

    #[test]
    fn test_composition_matches_raw_prices() {
        let base = PriceSeries::from_closes(&[83.1, 83.4, 83.2]);
        let quote = PriceSeries::from_closes(&[1.34, 1.35, 1.33]);
        let metrics = synthesize(&sgd_inr(), &base, &quote, &default_windows()).unwrap();

        assert!(approx(metrics.price, 83.2 / 1.33));
    }

    #[test]
    fn test_historical_uses_shorter_series() {
        let windows = vec![HistoricalWindow::new(2, "2D"), HistoricalWindow::new(4, "4D")];
        // base has 6 points, quote only 4: 4D needs more than 4 aligned points
        let base = PriceSeries::from_closes(&[1.0, 1.0, 8.0, 9.0, 10.0, 12.0]);
        let quote = PriceSeries::from_closes(&[2.0, 4.0, 5.0, 3.0]);
        let metrics = synthesize(&sgd_inr(), &base, &quote, &windows).unwrap();

        // current 12/3 = 4; 2D reads index 4 - 1 - 2 = 1 in both series: 1/4
        assert!(approx(metrics.historical_change("2D").unwrap(), 1500.0));
        assert_eq!(metrics.historical_change("4D"), None);
    }

    #[test]
    fn test_historical_aligned_when_quote_is_longer() {
        let windows = vec![HistoricalWindow::new(1, "1P")];
        let base = PriceSeries::from_closes(&[6.0, 8.0, 9.0]);
        let quote = PriceSeries::from_closes(&[5.0, 5.0, 4.0, 2.0, 3.0]);
        let metrics = synthesize(&sgd_inr(), &base, &quote, &windows).unwrap();

        // current 9/3 = 3; 1P reads index 3 - 1 - 1 = 1 in both: 8/5 = 1.6
        assert!(approx(metrics.price, 3.0));
        assert!(approx(metrics.historical_change("1P").unwrap(), (3.0 - 1.6) / 1.6 * 100.0));
    }

    #[test]
    fn test_zero_quote_history_skipped() {
        let windows = vec![HistoricalWindow::new(1, "1D"), HistoricalWindow::new(2, "2D")];
        let base = PriceSeries::from_closes(&[6.0, 5.0, 4.0]);
        let quote = PriceSeries::from_closes(&[3.0, 0.0, 2.0]);
        let metrics = synthesize(&sgd_inr(), &base, &quote, &windows).unwrap();

        assert_eq!(metrics.change_pct, None);
        assert_eq!(metrics.historical_change("1D"), None);
        assert!(approx(metrics.historical_change("2D").unwrap(), 0.0));
    }

    #[test]
    fn test_unusable_inputs_omitted() {
        let windows = default_windows();
        let good = PriceSeries::from_closes(&[1.0, 2.0]);

        assert!(synthesize(&sgd_inr(), &PriceSeries::from_closes(&[1.0]), &good, &windows).is_none());
        assert!(synthesize(&sgd_inr(), &good, &PriceSeries::from_closes(&[1.0, 0.0]), &windows).is_none());
        assert!(synthesize(&sgd_inr(), &PriceSeries::from_closes(&[1.0, 0.0]), &good, &windows).is_none());
    }

    #[test]
    fn test_missing_dependency_omitted() {
        let mut data = BatchDataset::new();
        data.insert("USDINR=X".to_string(), PriceSeries::from_closes(&[83.0, 84.0]));
        let windows = default_windows();

        assert!(synthesize_from(&sgd_inr(), |s| data.get(s), &windows).is_none());

        data.insert("USDSGD=X".to_string(), PriceSeries::from_closes(&[1.3, 1.4]));
        let metrics = synthesize_from(&sgd_inr(), |s| data.get(s), &windows).unwrap();
        assert!(approx(metrics.price, 60.0));
    }
}
