use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::MIN_SERIES_POINTS;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(time: DateTime<Utc>, close: f64) -> Self {
        Self { time, close }
    }
}

/// Time-ascending close series for one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points in any order. Points are sorted by time
    /// (stable, so same-timestamp points keep provider order).
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by(|a, b| a.time.cmp(&b.time));
        Self { points }
    }

    /// Series from bare closes, one day apart, oldest first
    pub fn from_closes(closes: &[f64]) -> Self {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Most recent close
    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    /// Close immediately before the most recent one
    pub fn previous(&self) -> Option<f64> {
        self.close_back(1)
    }

    /// Close `offset` points before the most recent one
    pub fn close_back(&self, offset: usize) -> Option<f64> {
        let last = self.points.len().checked_sub(1)?;
        let idx = last.checked_sub(offset)?;
        Some(self.points[idx].close)
    }

    /// Close at an absolute position, oldest first
    pub fn close_at(&self, idx: usize) -> Option<f64> {
        self.points.get(idx).map(|p| p.close)
    }

    /// Time of the most recent point
    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.time)
    }

    /// Enough points and a usable latest close
    pub fn is_usable(&self) -> bool {
        self.points.len() >= MIN_SERIES_POINTS
            && self.latest().map(is_valid_close).unwrap_or(false)
    }
}

/// A close that can be divided by
pub fn is_valid_close(close: f64) -> bool {
    close.is_finite() && close != 0.0
}

/// Per-symbol series returned by one batched request
pub type BatchDataset = HashMap<String, PriceSeries>;
