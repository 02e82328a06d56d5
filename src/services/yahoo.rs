//! Yahoo Finance Client
//!
//! Batch daily closes come from the spark endpoint (one request for all
//! symbols); valuation fields come from the batch quote endpoint.
//!
//! Status handling:
//! - 429 → `ProviderError::RateLimited` (retried by the batch fetcher)
//! - any other non-success status → `ProviderError::Http`
//! - transport errors without a status are classified from their message

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, ProviderError};
use crate::models::{BatchDataset, Fundamentals, PricePoint, PriceSeries};
use crate::services::provider::PriceProvider;

/// Base URL for Yahoo Finance query API
const BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
];

#[derive(Debug, Deserialize)]
struct SparkEnvelope {
    spark: SparkBody,
}

#[derive(Debug, Deserialize)]
struct SparkBody {
    #[serde(default)]
    result: Option<Vec<SparkResult>>,
    error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
struct SparkResult {
    symbol: String,
    #[serde(default)]
    response: Vec<ChartData>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooErrorBody {
    code: Option<String>,
    description: Option<String>,
}

impl YahooErrorBody {
    fn message(&self) -> String {
        format!(
            "{}: {}",
            self.code.as_deref().unwrap_or("error"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Vec<QuoteResult>,
    error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    symbol: String,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<f64>,
    target_low_price: Option<f64>,
    target_mean_price: Option<f64>,
    target_high_price: Option<f64>,
    /// e.g. "2.1 - Buy"
    average_analyst_rating: Option<String>,
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        Self::with_base_url(BASE_URL, timeout)
    }

    /// Client against another host serving the same API (mirrors, test servers)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        debug!(base_url = base_url.as_str(), timeout_secs = timeout.as_secs(), "Created YahooClient");

        Ok(Self { client, base_url })
    }

    fn get_user_agent(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = url.as_str(), params = ?query, "Yahoo request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(USER_AGENT, self.get_user_agent())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify_transport_error)?;

        if let Some(err) = classify_status(response.status(), path) {
            return Err(err);
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Response body error: {}", e)))
    }
}

impl PriceProvider for YahooClient {
    async fn fetch_batch(&self, symbols: &[String], lookback: &str) -> Result<BatchDataset, ProviderError> {
        let joined = symbols.join(",");
        let body = self
            .get_text(
                "/v7/finance/spark",
                &[("symbols", joined.as_str()), ("range", lookback), ("interval", "1d")],
            )
            .await?;
        parse_spark(&body)
    }

    async fn fetch_fundamentals(&self, symbols: &[String]) -> Result<HashMap<String, Fundamentals>, ProviderError> {
        let joined = symbols.join(",");
        let body = self
            .get_text("/v7/finance/quote", &[("symbols", joined.as_str())])
            .await?;
        parse_quotes(&body)
    }
}

/// Error for a non-success status; `None` when the body can be read
fn classify_status(status: StatusCode, path: &str) -> Option<ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(ProviderError::RateLimited(format!("Too Many Requests (429) from {}", path)));
    }
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        return Some(ProviderError::Http(format!("HTTP {} {} from {}", status.as_u16(), reason, path)));
    }
    None
}

fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
        return ProviderError::RateLimited(e.to_string());
    }
    if e.is_timeout() {
        return ProviderError::Http(format!("Request timed out: {}", e));
    }
    ProviderError::from_message(format!("Network error: {}", e))
}

/// Parse a spark response into per-symbol series. Null closes are dropped;
/// symbols with no points are left out.
pub(crate) fn parse_spark(body: &str) -> Result<BatchDataset, ProviderError> {
    let envelope: SparkEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let results = envelope.spark.result.unwrap_or_default();
    if results.is_empty() {
        return match envelope.spark.error {
            Some(err) => Err(ProviderError::from_message(err.message())),
            None => Err(ProviderError::NoData),
        };
    }

    let mut dataset = BatchDataset::new();
    for result in results {
        let Some(chart) = result.response.into_iter().next() else {
            debug!(symbol = result.symbol.as_str(), "No chart in response");
            continue;
        };
        let closes = chart
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        if closes.len() != chart.timestamp.len() {
            warn!(
                symbol = result.symbol.as_str(),
                timestamps = chart.timestamp.len(),
                closes = closes.len(),
                "Inconsistent array lengths, pairing the common prefix"
            );
        }

        let points: Vec<PricePoint> = chart
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| {
                let time = DateTime::<Utc>::from_timestamp(ts, 0)?;
                close.map(|c| PricePoint::new(time, c))
            })
            .collect();

        if points.is_empty() {
            debug!(symbol = result.symbol.as_str(), "No closes in response");
            continue;
        }
        dataset.insert(result.symbol, PriceSeries::new(points));
    }

    Ok(dataset)
}

pub(crate) fn parse_quotes(body: &str) -> Result<HashMap<String, Fundamentals>, ProviderError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    if envelope.quote_response.result.is_empty() {
        if let Some(err) = envelope.quote_response.error {
            return Err(ProviderError::from_message(err.message()));
        }
    }

    Ok(envelope
        .quote_response
        .result
        .into_iter()
        .map(|q| {
            let fundamentals = Fundamentals {
                week52_high: q.fifty_two_week_high,
                week52_low: q.fifty_two_week_low,
                pe_trailing: q.trailing_pe,
                pe_forward: q.forward_pe,
                target_low: q.target_low_price,
                target_mean: q.target_mean_price,
                target_high: q.target_high_price,
                recommendation: q.average_analyst_rating.as_deref().and_then(parse_recommendation),
            };
            (q.symbol, fundamentals)
        })
        .collect())
}

/// "1.4 - Strong Buy" → "STRONG_BUY"
fn parse_recommendation(rating: &str) -> Option<String> {
    let label = rating.split_once('-').map(|(_, l)| l).unwrap_or(rating).trim();
    if label.is_empty() {
        return None;
    }
    Some(label.to_uppercase().replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPARK_BODY: &str = r#"{
        "spark": {
            "result": [
                {
                    "symbol": "^GSPC",
                    "response": [{
                        "meta": {"currency": "USD"},
                        "timestamp": [1704412800, 1704240000, 1704326400],
                        "indicators": {"quote": [{"close": [4697.24, 4742.83, null]}]}
                    }]
                },
                {
                    "symbol": "EURUSD=X",
                    "response": [{
                        "timestamp": [1704240000, 1704326400],
                        "indicators": {"quote": [{"close": [1.0942, 1.0921]}]}
                    }]
                },
                {
                    "symbol": "DELISTED",
                    "response": [{"timestamp": [], "indicators": {"quote": [{"close": []}]}}]
                }
            ],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_spark() {
        let dataset = parse_spark(SPARK_BODY).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(!dataset.contains_key("DELISTED"));

        // null close dropped, remaining points sorted by time
        let gspc = &dataset["^GSPC"];
        assert_eq!(gspc.len(), 2);
        assert_eq!(gspc.latest(), Some(4697.24));
        assert_eq!(gspc.previous(), Some(4742.83));

        assert_eq!(dataset["EURUSD=X"].latest(), Some(1.0921));
    }

    #[test]
    fn test_parse_spark_errors() {
        let rate_limited = r#"{"spark": {"result": null, "error": {"code": "Too Many Requests", "description": "Rate limit exceeded"}}}"#;
        assert!(matches!(parse_spark(rate_limited), Err(ProviderError::RateLimited(_))));

        let not_found = r#"{"spark": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#;
        assert!(matches!(parse_spark(not_found), Err(ProviderError::Http(_))));

        let empty = r#"{"spark": {"result": [], "error": null}}"#;
        assert_eq!(parse_spark(empty), Err(ProviderError::NoData));

        assert!(matches!(parse_spark("<html>"), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_quotes() {
        let body = r#"{
            "quoteResponse": {
                "result": [
                    {"symbol": "NVDA", "fiftyTwoWeekHigh": 152.89, "fiftyTwoWeekLow": 75.61,
                     "trailingPE": 55.1, "forwardPE": 32.4, "averageAnalystRating": "1.3 - Strong Buy",
                     "targetLowPrice": 110.0, "targetMeanPrice": 165.5, "targetHighPrice": 220.0},
                    {"symbol": "^GSPC", "fiftyTwoWeekHigh": 6099.97}
                ],
                "error": null
            }
        }"#;
        let quotes = parse_quotes(body).unwrap();

        let nvda = &quotes["NVDA"];
        assert_eq!(nvda.pe_trailing, Some(55.1));
        assert_eq!(nvda.recommendation.as_deref(), Some("STRONG_BUY"));
        assert_eq!(nvda.target_low, Some(110.0));
        assert_eq!(nvda.target_mean, Some(165.5));
        assert_eq!(nvda.target_high, Some(220.0));

        let index = &quotes["^GSPC"];
        assert_eq!(index.week52_high, Some(6099.97));
        assert_eq!(index.pe_forward, None);
        assert_eq!(index.target_mean, None);
        assert_eq!(index.recommendation, None);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK, "/v7/finance/spark"), None);
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "/v7/finance/spark"),
            Some(ProviderError::RateLimited(_))
        ));

        let err = classify_status(StatusCode::NOT_FOUND, "/v7/finance/quote").unwrap();
        assert_eq!(err, ProviderError::Http("HTTP 404 Not Found from /v7/finance/quote".to_string()));
        assert!(!err.is_transient());

        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "/v7/finance/spark"),
            Some(ProviderError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_error_without_status_is_permanent() {
        // nothing listens on port 9 of localhost: connect fails with no status
        let client = YahooClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.get_text("/v7/finance/spark", &[]).await.unwrap_err();

        assert!(matches!(err, ProviderError::Http(ref msg) if msg.starts_with("Network error") || msg.starts_with("Request timed out")));
    }

    #[test]
    fn test_parse_recommendation() {
        assert_eq!(parse_recommendation("2.1 - Buy").as_deref(), Some("BUY"));
        assert_eq!(parse_recommendation("Hold").as_deref(), Some("HOLD"));
        assert_eq!(parse_recommendation("3.0 - ").as_deref(), None);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(YahooClient::with_base_url("ftp://example.com", Duration::from_secs(5)).is_err());
        assert!(YahooClient::with_base_url("https://example.com/", Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_batch_live() {
        let client = YahooClient::new(Duration::from_secs(30)).unwrap();
        let symbols = vec!["^GSPC".to_string(), "EURUSD=X".to_string()];

        let dataset = client.fetch_batch(&symbols, "1mo").await.unwrap();
        assert!(dataset.values().all(|s| s.len() >= 2));
    }
}
