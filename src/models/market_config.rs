//! Market Universe Configuration
//!
//! Views (ordered sections of symbols), stock movers, the inversion set,
//! cross-rate definitions and the historical-window catalogue. Built-in
//! defaults cover global indices, commodities, crypto, currencies and
//! US/Singapore/India large caps; a JSON file with the same shape can
//! replace them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::constants::DEFAULT_LOOKBACK;
use crate::error::{Error, Result};
use crate::models::window::{default_windows, HistoricalWindow};

/// One row: provider symbol plus display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub symbol: String,
    pub name: String,
}

/// Named, ordered group of tickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub tickers: Vec<TickerEntry>,
}

impl Section {
    pub fn new(name: &str, tickers: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            tickers: tickers
                .iter()
                .map(|(symbol, name)| TickerEntry {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

/// Synthetic instrument priced as `base / quote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRateDefinition {
    pub name: String,
    pub base: String,
    pub quote: String,
}

impl CrossRateDefinition {
    pub fn new(name: &str, base: &str, quote: &str) -> Self {
        Self {
            name: name.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// Which configured view to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// All markets
    #[default]
    Detail,
    /// Key indices only
    Summary,
    /// Personal holdings
    Portfolio,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Detail => "detail",
            View::Summary => "summary",
            View::Portfolio => "portfolio",
        }
    }
}

/// Sections and heading for one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub view: View,
    pub title: String,
    pub sections: Vec<Section>,
}

/// Static inputs of one overview cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub views: Vec<ViewConfig>,

    /// Individual stocks ranked per region
    #[serde(default)]
    pub movers: Vec<Section>,

    /// Symbols whose raw quote is the reciprocal of the displayed one
    #[serde(default)]
    pub invert: Vec<String>,

    #[serde(default)]
    pub cross_rates: Vec<CrossRateDefinition>,

    #[serde(default = "default_windows")]
    pub windows: Vec<HistoricalWindow>,

    #[serde(default = "default_lookback")]
    pub lookback: String,
}

fn default_lookback() -> String {
    DEFAULT_LOOKBACK.to_string()
}

impl MarketConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: MarketConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else `MARKET_CONFIG`, else built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match crate::utils::get_config_path() {
                Some(path) => Self::from_file(path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.views.is_empty() {
            return Err(Error::Config("At least one view is required".to_string()));
        }

        for view in &self.views {
            if view.sections.iter().all(|s| s.tickers.is_empty()) {
                return Err(Error::Config(format!("View '{}' has no tickers", view.view.as_str())));
            }
        }

        for section in self.views.iter().flat_map(|v| v.sections.iter()).chain(self.movers.iter()) {
            let mut symbols = HashSet::new();
            if let Some(dup) = section.tickers.iter().find(|t| !symbols.insert(t.symbol.as_str())) {
                return Err(Error::Config(format!(
                    "Symbol '{}' is listed twice in section '{}'",
                    dup.symbol, section.name
                )));
            }
        }

        if self.windows.iter().any(|w| w.offset == 0) {
            return Err(Error::Config("Historical window offsets must be positive".to_string()));
        }

        if self.windows.windows(2).any(|w| w[0].offset >= w[1].offset) {
            return Err(Error::Config("Historical windows must be strictly ascending by offset".to_string()));
        }

        let mut labels = HashSet::new();
        if let Some(dup) = self.windows.iter().find(|w| !labels.insert(w.label.as_str())) {
            return Err(Error::Config(format!("Duplicate window label '{}'", dup.label)));
        }

        for cross in &self.cross_rates {
            if self.cross_rates.iter().any(|c| c.base == cross.name || c.quote == cross.name) {
                return Err(Error::Config(format!(
                    "Cross rate '{}' cannot be the base or quote of another cross rate",
                    cross.name
                )));
            }
            if cross.base == cross.quote {
                return Err(Error::Config(format!("Cross rate '{}' uses the same base and quote", cross.name)));
            }
        }

        if self.lookback.trim().is_empty() {
            return Err(Error::Config("Lookback period cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn view(&self, view: View) -> Option<&ViewConfig> {
        self.views.iter().find(|v| v.view == view)
    }

    pub fn is_inverted(&self, symbol: &str) -> bool {
        self.invert.iter().any(|s| s == symbol)
    }

    pub fn cross_rate(&self, name: &str) -> Option<&CrossRateDefinition> {
        self.cross_rates.iter().find(|c| c.name == name)
    }

    /// Provider symbols needed for a view: its tickers, cross-rate
    /// dependencies and optionally the movers. Cross-rate names are
    /// synthesized, never fetched. Sorted and deduplicated.
    pub fn collect_symbols(&self, view: &ViewConfig, include_movers: bool) -> Vec<String> {
        let mut symbols: Vec<String> = view
            .sections
            .iter()
            .flat_map(|s| s.tickers.iter().map(|t| t.symbol.clone()))
            .collect();

        for cross in &self.cross_rates {
            symbols.push(cross.base.clone());
            symbols.push(cross.quote.clone());
        }

        if include_movers {
            symbols.extend(
                self.movers
                    .iter()
                    .flat_map(|s| s.tickers.iter().map(|t| t.symbol.clone())),
            );
        }

        symbols.retain(|s| self.cross_rate(s).is_none());
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        let detail = ViewConfig {
            view: View::Detail,
            title: "World Markets Overview".to_string(),
            sections: vec![
                Section::new(
                    "US Markets",
                    &[
                        ("^GSPC", "S&P 500"),
                        ("^DJI", "Dow Jones"),
                        ("^IXIC", "NASDAQ"),
                        ("^RUT", "Russell 2000"),
                        ("^VIX", "VIX (Fear Index)"),
                    ],
                ),
                Section::new(
                    "European Markets",
                    &[
                        ("^FTSE", "FTSE 100 (UK)"),
                        ("^GDAXI", "DAX (Germany)"),
                        ("^FCHI", "CAC 40 (France)"),
                        ("^STOXX50E", "Euro Stoxx 50"),
                    ],
                ),
                Section::new(
                    "Asian Markets",
                    &[
                        ("^N225", "Nikkei 225 (Japan)"),
                        ("^HSI", "Hang Seng (HK)"),
                        ("000001.SS", "Shanghai Composite"),
                        ("^STI", "STI (Singapore)"),
                        ("^BSESN", "Sensex (India)"),
                        ("^NSEI", "Nifty 50 (India)"),
                        ("^KS11", "KOSPI (Korea)"),
                        ("^TWII", "TAIEX (Taiwan)"),
                    ],
                ),
                commodities_and_crypto(),
                Section::new(
                    "Currencies",
                    &[
                        ("EURUSD=X", "USD/EUR"),
                        ("GBPUSD=X", "USD/GBP"),
                        ("USDJPY=X", "USD/JPY"),
                        ("USDCNY=X", "USD/CNY"),
                        ("USDINR=X", "USD/INR"),
                        ("USDSGD=X", "USD/SGD"),
                        ("USDMYR=X", "USD/MYR"),
                        ("SGD/INR", "SGD/INR"),
                        ("SGD/MYR", "SGD/MYR"),
                    ],
                ),
            ],
        };

        let summary = ViewConfig {
            view: View::Summary,
            title: "Market Summary".to_string(),
            sections: vec![
                Section::new(
                    "Key Indices",
                    &[
                        ("^GSPC", "S&P 500"),
                        ("^IXIC", "NASDAQ"),
                        ("^HSI", "Hang Seng (HK)"),
                        ("^STI", "STI (Singapore)"),
                        ("^BSESN", "Sensex (India)"),
                        ("^NSEI", "Nifty 50 (India)"),
                    ],
                ),
                commodities_and_crypto(),
                Section::new(
                    "Currencies",
                    &[
                        ("USDINR=X", "USD/INR"),
                        ("USDSGD=X", "USD/SGD"),
                        ("SGD/INR", "SGD/INR"),
                        ("SGD/MYR", "SGD/MYR"),
                    ],
                ),
            ],
        };

        let portfolio = ViewConfig {
            view: View::Portfolio,
            title: "My Portfolio".to_string(),
            sections: vec![Section::new(
                "My Portfolio",
                &[
                    ("TSLA", "Tesla"),
                    ("NVDA", "NVIDIA"),
                    ("V", "Visa"),
                    ("MSFT", "Microsoft"),
                    ("META", "Meta"),
                    ("GOOGL", "Google"),
                    ("AMZN", "Amazon"),
                    ("AMD", "AMD"),
                    ("AVGO", "Broadcom"),
                    ("AAPL", "Apple"),
                ],
            )],
        };

        let movers = vec![
            Section::new(
                "US Stocks",
                &[
                    ("TSLA", "Tesla"),
                    ("NVDA", "NVIDIA"),
                    ("AAPL", "Apple"),
                    ("MSFT", "Microsoft"),
                    ("GOOGL", "Google"),
                    ("AMZN", "Amazon"),
                    ("META", "Meta"),
                    ("AMD", "AMD"),
                    ("AVGO", "Broadcom"),
                    ("V", "Visa"),
                    ("JPM", "JPMorgan"),
                    ("BAC", "Bank of America"),
                    ("WMT", "Walmart"),
                    ("DIS", "Disney"),
                    ("NFLX", "Netflix"),
                ],
            ),
            Section::new(
                "Singapore Stocks",
                &[
                    ("D05.SI", "DBS Group"),
                    ("O39.SI", "OCBC Bank"),
                    ("U11.SI", "UOB"),
                    ("Z74.SI", "Singtel"),
                    ("C6L.SI", "Singapore Airlines"),
                    ("C38U.SI", "CapitaLand"),
                    ("G13.SI", "Genting Singapore"),
                    ("S58.SI", "SATS"),
                ],
            ),
            Section::new(
                "India Stocks",
                &[
                    ("RELIANCE.NS", "Reliance"),
                    ("TCS.NS", "TCS"),
                    ("INFY.NS", "Infosys"),
                    ("HDFCBANK.NS", "HDFC Bank"),
                    ("ICICIBANK.NS", "ICICI Bank"),
                    ("HINDUNILVR.NS", "Hindustan Unilever"),
                    ("ITC.NS", "ITC"),
                    ("SBIN.NS", "SBI"),
                    ("BHARTIARTL.NS", "Bharti Airtel"),
                    ("WIPRO.NS", "Wipro"),
                ],
            ),
        ];

        Self {
            views: vec![detail, summary, portfolio],
            movers,
            // shown as USD/EUR and USD/GBP
            invert: vec!["EURUSD=X".to_string(), "GBPUSD=X".to_string()],
            // SGD/INR = USDINR / USDSGD, SGD/MYR = USDMYR / USDSGD
            cross_rates: vec![
                CrossRateDefinition::new("SGD/INR", "USDINR=X", "USDSGD=X"),
                CrossRateDefinition::new("SGD/MYR", "USDMYR=X", "USDSGD=X"),
            ],
            windows: default_windows(),
            lookback: default_lookback(),
        }
    }
}

fn commodities_and_crypto() -> Section {
    Section::new(
        "Commodities & Crypto",
        &[
            ("GC=F", "Gold"),
            ("SI=F", "Silver"),
            ("CL=F", "Crude Oil (WTI)"),
            ("BZ=F", "Brent Crude"),
            ("BTC-USD", "Bitcoin"),
            ("ETH-USD", "Ethereum"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MarketConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.views.len(), 3);
        assert!(config.is_inverted("EURUSD=X"));
        assert!(!config.is_inverted("USDJPY=X"));
        assert_eq!(config.view(View::Summary).map(|v| v.title.as_str()), Some("Market Summary"));
    }

    #[test]
    fn test_collect_symbols_excludes_cross_rates() {
        let config = MarketConfig::default();
        let view = config.view(View::Summary).unwrap();
        let symbols = config.collect_symbols(view, false);

        assert!(!symbols.iter().any(|s| s == "SGD/INR" || s == "SGD/MYR"));
        // cross-rate dependencies pulled in even when not listed in the view
        assert!(symbols.contains(&"USDMYR=X".to_string()));
        assert!(!symbols.contains(&"TSLA".to_string()));

        let mut sorted = symbols.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(symbols, sorted);
    }

    #[test]
    fn test_collect_symbols_with_movers_deduplicates() {
        let config = MarketConfig::default();
        let view = config.view(View::Portfolio).unwrap();
        let symbols = config.collect_symbols(view, true);

        assert_eq!(symbols.iter().filter(|s| s.as_str() == "TSLA").count(), 1);
        assert!(symbols.contains(&"D05.SI".to_string()));
    }

    #[test]
    fn test_validate_rejects_unordered_windows() {
        let mut config = MarketConfig::default();
        config.windows.swap(0, 1);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_symbol_in_section() {
        let mut config = MarketConfig::default();
        config.views[0].sections[0].tickers.push(TickerEntry {
            symbol: "^GSPC".to_string(),
            name: "S&P 500 again".to_string(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'^GSPC' is listed twice"));

        let mut movers = MarketConfig::default();
        movers.movers.push(Section::new("Dupes", &[("AAPL", "Apple"), ("AAPL", "Apple Inc")]));
        assert!(movers.validate().is_err());
    }

    #[test]
    fn test_same_symbol_in_different_sections_is_allowed() {
        let mut config = MarketConfig::default();
        config.views[0].sections.push(Section::new("Repeat", &[("^GSPC", "S&P 500")]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_view_defaults_to_detail() {
        assert_eq!(View::default(), View::Detail);
    }

    #[test]
    fn test_from_file_errors_name_the_path() {
        let dir = std::env::temp_dir().join(format!("market-overview-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        let err = MarketConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("missing.json")));

        let broken = dir.join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let err = MarketConfig::from_file(&broken).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("Failed to parse")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_rejects_nested_cross_rates() {
        let mut config = MarketConfig::default();
        config
            .cross_rates
            .push(CrossRateDefinition::new("INR/MYR", "SGD/MYR", "SGD/INR"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_section_order() {
        let config = MarketConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MarketConfig = serde_json::from_str(&json).unwrap();

        let names: Vec<&str> = parsed.views[0].sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["US Markets", "European Markets", "Asian Markets", "Commodities & Crypto", "Currencies"]
        );
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "views": [
                {"view": "portfolio", "title": "Mine", "sections": [
                    {"name": "Holdings", "tickers": [{"symbol": "AAPL", "name": "Apple"}]}
                ]}
            ]
        }"#;
        let config: MarketConfig = serde_json::from_str(json).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.windows, default_windows());
        assert_eq!(config.lookback, "10y");
        assert!(config.cross_rates.is_empty());
    }
}
