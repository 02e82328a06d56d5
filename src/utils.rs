use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;

/// Get market configuration file from environment variable, if set
pub fn get_config_path() -> Option<PathBuf> {
    std::env::var("MARKET_CONFIG")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Per-attempt HTTP deadline from `HTTP_TIMEOUT_SECS` or the default
pub fn get_http_timeout() -> Duration {
    let secs = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}
