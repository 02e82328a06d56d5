use serde::Serialize;
use std::path::PathBuf;

use crate::models::{Fundamentals, HistoricalWindow, InstrumentMetrics, MarketConfig, Section, View, ViewConfig};
use crate::services::{rank, BatchFetcher, CycleReport, MarketOverview, RankedSummary, SectionMovers, YahooClient};
use crate::utils::get_http_timeout;

const NAME_WIDTH: usize = 24;
const COLUMN_WIDTH: usize = 9;

pub fn run(view: View, include_movers: bool, with_fundamentals: bool, json: bool, config_path: Option<PathBuf>) {
    let config = match MarketConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let client = match YahooClient::new(get_http_timeout()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let overview = MarketOverview::new(BatchFetcher::new(client), config);
    let report = match runtime.block_on(overview.run_cycle(view, include_movers, with_fundamentals)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\n❌ Could not fetch market data: {}", e);
            eprintln!("   No data shown. Try again in a few minutes.");
            std::process::exit(1);
        }
    };

    let config = overview.config();
    let Some(view_config) = config.view(view) else {
        eprintln!("❌ View '{}' is not configured", view.as_str());
        std::process::exit(1);
    };
    let movers: &[Section] = if include_movers { config.movers.as_slice() } else { &[] };

    if json {
        let output = OverviewOutput::new(view_config, movers, &report);
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize overview: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_report(view_config, movers, &config.windows, &report);
    }
}

#[derive(Serialize)]
struct OverviewOutput<'a> {
    view: View,
    title: &'a str,
    fetched_at: chrono::DateTime<chrono::Utc>,
    sections: Vec<SectionOutput<'a>>,
    index_movers: RankedSummary,
    stock_movers: Vec<SectionMovers>,
    dropped_symbols: &'a [String],
    dropped_cross_rates: &'a [String],
}

#[derive(Serialize)]
struct SectionOutput<'a> {
    name: &'a str,
    rows: Vec<RowOutput<'a>>,
}

#[derive(Serialize)]
struct RowOutput<'a> {
    symbol: &'a str,
    name: &'a str,
    /// `null` when the symbol had no usable data this cycle
    metrics: Option<&'a InstrumentMetrics>,
}

impl<'a> OverviewOutput<'a> {
    fn new(view: &'a ViewConfig, movers: &[Section], report: &'a CycleReport) -> Self {
        let sections = view
            .sections
            .iter()
            .map(|s| SectionOutput {
                name: &s.name,
                rows: s
                    .tickers
                    .iter()
                    .map(|t| RowOutput {
                        symbol: &t.symbol,
                        name: &t.name,
                        metrics: report.metrics.get(&t.symbol),
                    })
                    .collect(),
            })
            .collect();

        Self {
            view: view.view,
            title: &view.title,
            fetched_at: report.fetched_at,
            sections,
            index_movers: rank(&report.metrics, &view.sections),
            stock_movers: rank(&report.metrics, movers).sections,
            dropped_symbols: &report.dropped_symbols,
            dropped_cross_rates: &report.dropped_cross_rates,
        }
    }
}

fn print_report(view: &ViewConfig, movers: &[Section], windows: &[HistoricalWindow], report: &CycleReport) {
    println!("🌍 {}", view.title);
    println!("   As of {}", report.fetched_at.format("%Y-%m-%d %H:%M UTC"));

    for section in &view.sections {
        println!("\n═══ {} ═══", section.name);
        println!("{}", header_line(windows));
        for ticker in &section.tickers {
            println!("{}", row_line(&ticker.name, report.metrics.get(&ticker.symbol), windows));
            if let Some(line) = report
                .metrics
                .get(&ticker.symbol)
                .and_then(fundamentals_line)
            {
                println!("{}", line);
            }
        }
    }

    let index_movers = rank(&report.metrics, &view.sections);
    println!("\n📈 Top Movers");
    for section in &index_movers.sections {
        print_movers(section);
    }
    print_movers(&index_movers.overall);

    if !movers.is_empty() {
        println!("\n🏢 Stock Movers");
        for section in rank(&report.metrics, movers).sections {
            print_movers(&section);
        }
    }

    if report.is_degraded() {
        println!(
            "\n⚠️  {} of {} instruments had no data this cycle",
            report.dropped_symbols.len() + report.dropped_cross_rates.len(),
            report.requested + report.cross_rates
        );
    }
}

fn header_line(windows: &[HistoricalWindow]) -> String {
    let mut line = format!("{:<NAME_WIDTH$} {:>14} {:>COLUMN_WIDTH$}", "", "Price", "1D");
    for w in windows {
        line.push_str(&format!(" {:>COLUMN_WIDTH$}", w.label));
    }
    line
}

fn row_line(name: &str, metrics: Option<&InstrumentMetrics>, windows: &[HistoricalWindow]) -> String {
    let name = truncate(name, NAME_WIDTH);
    let Some(m) = metrics else {
        return format!("{:<NAME_WIDTH$} {:>14}", name, "N/A");
    };

    let mut line = format!(
        "{:<NAME_WIDTH$} {:>14} {:>COLUMN_WIDTH$}",
        name,
        format_price(m.price),
        format_change(m.change_pct)
    );
    for w in windows {
        line.push_str(&format!(" {:>COLUMN_WIDTH$}", format_change(m.historical_change(&w.label))));
    }
    line
}

fn fundamentals_line(metrics: &InstrumentMetrics) -> Option<String> {
    let f = metrics.fundamentals.as_ref()?;
    let mut parts = Vec::new();
    if let (Some(low), Some(high)) = (f.week52_low, f.week52_high) {
        parts.push(format!("52w {} - {}", format_price(low), format_price(high)));
    }
    if let Some(pe) = f.pe_trailing {
        parts.push(format!("P/E {:.1}", pe));
    }
    if let Some(pe) = f.pe_forward {
        parts.push(format!("Fwd P/E {:.1}", pe));
    }
    if let Some(target) = target_range(f) {
        parts.push(format!("Target {}", target));
    }
    if let Some(rec) = &f.recommendation {
        parts.push(rec.clone());
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("{:NAME_WIDTH$}   {}", "", parts.join(" | ")))
}

/// "L-M-H" when both bounds are known, else the mean alone
fn target_range(f: &Fundamentals) -> Option<String> {
    match (f.target_low, f.target_mean, f.target_high) {
        (Some(low), Some(mean), Some(high)) => Some(format!("{:.0}-{:.0}-{:.0}", low, mean, high)),
        (_, Some(mean), _) => Some(format!("{:.0}", mean)),
        _ => None,
    }
}

fn print_movers(section: &SectionMovers) {
    println!("\n   {}", section.name);
    if section.is_empty() {
        println!("   No movers");
        return;
    }
    for i in 0..section.row_count() {
        let gainer = section
            .gainers
            .get(i)
            .map(|m| format!("{:<20} {:>8}", truncate(&m.name, 20), format_change(Some(m.change_pct))))
            .unwrap_or_default();
        let loser = section
            .losers
            .get(i)
            .map(|m| format!("{:<20} {:>8}", truncate(&m.name, 20), format_change(Some(m.change_pct))))
            .unwrap_or_default();
        println!("   🟢 {:<29}  🔴 {}", gainer, loser);
    }
}

/// Small values (currencies, cross rates) get four decimals
fn format_price(price: f64) -> String {
    if price.abs() < 10.0 {
        format!("{:.4}", price)
    } else {
        format!("{:.2}", price)
    }
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) => format!("{:+.2}%", c),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
