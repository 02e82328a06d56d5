//! Top movers ranking
//!
//! Splits each section into gainers and losers by one-day change and keeps
//! the most extreme moves. Pure: same metrics and sections, same output.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::constants::TOP_MOVERS_LIMIT;
use crate::models::{MetricsMap, Section, TickerEntry};

/// Heading of the combined ranking across all sections
pub const ALL_SECTIONS: &str = "All Sections";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mover {
    pub symbol: String,
    pub name: String,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionMovers {
    pub name: String,
    /// Largest rise first
    pub gainers: Vec<Mover>,
    /// Largest fall first
    pub losers: Vec<Mover>,
    /// Entries with no metrics this cycle
    pub unavailable: usize,
}

impl SectionMovers {
    pub fn is_empty(&self) -> bool {
        self.gainers.is_empty() && self.losers.is_empty()
    }

    /// Rows needed to show gainers and losers side by side
    pub fn row_count(&self) -> usize {
        self.gainers.len().max(self.losers.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSummary {
    pub sections: Vec<SectionMovers>,
    pub overall: SectionMovers,
}

/// Rank every section and the union of all sections (first occurrence of a
/// symbol wins in the combined view)
pub fn rank(metrics: &MetricsMap, sections: &[Section]) -> RankedSummary {
    let ranked = sections
        .iter()
        .map(|s| rank_entries(&s.name, s.tickers.iter(), metrics, TOP_MOVERS_LIMIT))
        .collect();

    let mut seen = HashSet::new();
    let combined = sections
        .iter()
        .flat_map(|s| s.tickers.iter())
        .filter(|t| seen.insert(t.symbol.clone()));
    let overall = rank_entries(ALL_SECTIONS, combined, metrics, TOP_MOVERS_LIMIT);

    RankedSummary {
        sections: ranked,
        overall,
    }
}

pub fn rank_entries<'a>(
    name: &str,
    entries: impl Iterator<Item = &'a TickerEntry>,
    metrics: &MetricsMap,
    limit: usize,
) -> SectionMovers {
    let mut gainers = Vec::new();
    let mut losers = Vec::new();
    let mut unavailable = 0;

    for entry in entries {
        let Some(m) = metrics.get(&entry.symbol) else {
            unavailable += 1;
            continue;
        };
        let Some(change_pct) = m.change_pct else {
            continue;
        };
        let mover = Mover {
            symbol: entry.symbol.clone(),
            name: entry.name.clone(),
            change_pct,
        };
        if change_pct > 0.0 {
            gainers.push(mover);
        } else if change_pct < 0.0 {
            losers.push(mover);
        }
    }

    // sort_by is stable: ties keep section order
    gainers.sort_by(|a, b| b.change_pct.partial_cmp(&a.change_pct).unwrap_or(Ordering::Equal));
    losers.sort_by(|a, b| a.change_pct.partial_cmp(&b.change_pct).unwrap_or(Ordering::Equal));
    gainers.truncate(limit);
    losers.truncate(limit);

    SectionMovers {
        name: name.to_string(),
        gainers,
        losers,
        unavailable,
    }
}
