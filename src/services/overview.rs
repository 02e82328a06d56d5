//! Overview pipeline
//!
//! One cycle: collect the symbol universe, fetch it in a single batch,
//! normalize every symbol, then synthesize cross rates from the raw series.
//! Synthesis only starts once normalization of the whole batch is done.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants::DROP_WARN_RATIO;
use crate::error::{Error, Result};
use crate::models::{BatchDataset, MarketConfig, MetricsMap, View};
use crate::services::batch_fetcher::BatchFetcher;
use crate::services::cross_rate::synthesize_from;
use crate::services::normalizer::TickerNormalizer;
use crate::services::provider::PriceProvider;

/// Result of one fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub metrics: MetricsMap,
    /// Provider symbols requested in the batch
    pub requested: usize,
    /// Requested symbols that produced no metrics
    pub dropped_symbols: Vec<String>,
    /// Configured cross rates
    pub cross_rates: usize,
    /// Cross rates that could not be synthesized
    pub dropped_cross_rates: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl CycleReport {
    /// Share of expected instruments (symbols and cross rates) with no metrics
    pub fn drop_ratio(&self) -> f64 {
        let expected = self.requested + self.cross_rates;
        if expected == 0 {
            return 0.0;
        }
        (self.dropped_symbols.len() + self.dropped_cross_rates.len()) as f64 / expected as f64
    }

    pub fn is_degraded(&self) -> bool {
        self.drop_ratio() > DROP_WARN_RATIO
    }
}

/// Normalize every requested symbol, then synthesize every configured cross
/// rate. Pure over the fetched dataset.
pub fn build_metrics(dataset: &BatchDataset, symbols: &[String], config: &MarketConfig) -> CycleReport {
    let normalizer = TickerNormalizer::from_config(config);
    let mut metrics = MetricsMap::new();
    let mut dropped_symbols = Vec::new();

    let requested: HashSet<&str> = symbols.iter().map(String::as_str).collect();
    let mut ordered: Vec<&str> = requested.iter().copied().collect();
    ordered.sort_unstable();

    for symbol in ordered {
        let normalized = dataset
            .get(symbol)
            .and_then(|series| normalizer.normalize(symbol, series));
        match normalized {
            Some(m) => {
                metrics.insert(symbol.to_string(), m);
            }
            None => {
                if !dataset.contains_key(symbol) {
                    debug!(symbol = symbol, "Symbol missing from batch");
                }
                dropped_symbols.push(symbol.to_string());
            }
        }
    }

    let mut dropped_cross_rates = Vec::new();
    for definition in &config.cross_rates {
        match synthesize_from(definition, |s| dataset.get(s), &config.windows) {
            Some(m) => {
                metrics.insert(definition.name.clone(), m);
            }
            None => dropped_cross_rates.push(definition.name.clone()),
        }
    }

    let report = CycleReport {
        metrics,
        requested: requested.len(),
        dropped_symbols,
        cross_rates: config.cross_rates.len(),
        dropped_cross_rates,
        fetched_at: Utc::now(),
    };

    if report.is_degraded() {
        warn!(
            dropped_symbols = report.dropped_symbols.len(),
            dropped_cross_rates = report.dropped_cross_rates.len(),
            requested = report.requested,
            "More than {:.0}% of instruments have no data this cycle",
            DROP_WARN_RATIO * 100.0
        );
    } else if !report.dropped_symbols.is_empty() || !report.dropped_cross_rates.is_empty() {
        info!(
            dropped_symbols = ?report.dropped_symbols,
            dropped_cross_rates = ?report.dropped_cross_rates,
            "Some instruments have no data this cycle"
        );
    }

    report
}

/// Drives overview cycles against one provider and configuration
pub struct MarketOverview<P> {
    fetcher: BatchFetcher<P>,
    config: MarketConfig,
}

impl<P: PriceProvider> MarketOverview<P> {
    pub fn new(fetcher: BatchFetcher<P>, config: MarketConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Run one cycle for `view`. A failed batch ends the cycle with no metrics;
    /// fundamentals are attached best effort.
    pub async fn run_cycle(&self, view: View, include_movers: bool, with_fundamentals: bool) -> Result<CycleReport> {
        let view_config = self
            .config
            .view(view)
            .ok_or_else(|| Error::InvalidInput(format!("View '{}' is not configured", view.as_str())))?;

        let symbols = self.config.collect_symbols(view_config, include_movers);
        info!(
            view = view.as_str(),
            symbols_count = symbols.len(),
            include_movers = include_movers,
            "Starting overview cycle"
        );

        let dataset = self.fetcher.fetch(&symbols, &self.config.lookback).await?;
        let mut report = build_metrics(&dataset, &symbols, &self.config);

        if with_fundamentals {
            self.attach_fundamentals(&mut report).await;
        }

        info!(
            instruments = report.metrics.len(),
            dropped = report.dropped_symbols.len() + report.dropped_cross_rates.len(),
            "Overview cycle complete"
        );
        Ok(report)
    }

    async fn attach_fundamentals(&self, report: &mut CycleReport) {
        let mut symbols: Vec<String> = report
            .metrics
            .keys()
            .filter(|s| self.config.cross_rate(s).is_none())
            .cloned()
            .collect();
        if symbols.is_empty() {
            return;
        }
        symbols.sort();

        match self.fetcher.provider().fetch_fundamentals(&symbols).await {
            Ok(fundamentals) => {
                let mut attached = 0;
                for (symbol, f) in fundamentals {
                    if let Some(m) = report.metrics.remove(&symbol) {
                        let enriched = m.with_fundamentals(f);
                        if enriched.fundamentals.is_some() {
                            attached += 1;
                        }
                        report.metrics.insert(symbol, enriched);
                    }
                }
                debug!(attached = attached, "Fundamentals attached");
            }
            Err(e) => warn!(error = %e, "Failed to fetch fundamentals, continuing without them"),
        }
    }
}
