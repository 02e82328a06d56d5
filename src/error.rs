use thiserror::Error as ThisError;

/// Failure reported by a price provider for one batched request.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Provider throttled the request (HTTP 429 or an equivalent signal)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data available")]
    NoData,
}

impl ProviderError {
    /// Whether a retry may succeed where this attempt failed
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    /// Classify a free-form transport message. Only used when the failure
    /// carries no status code of its own.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("rate") || lower.contains("limit") || lower.contains("429") {
            ProviderError::RateLimited(message)
        } else {
            ProviderError::Http(message)
        }
    }
}

/// Outcome of the retrying batch fetch when no dataset could be produced.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Refusing to fetch an empty symbol set")]
    NoSymbols,

    #[error("Provider failed: {0}")]
    Provider(ProviderError),

    #[error("Rate limit exceeded after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ProviderError },

    #[error("Provider returned no usable series")]
    Empty,
}

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_classification() {
        // no marker word, so treated as permanent
        assert!(!ProviderError::from_message("Too Many Requests").is_transient());
        assert!(ProviderError::from_message("HTTP 429").is_transient());
        assert!(ProviderError::from_message("Rate limited, try later").is_transient());
        assert!(ProviderError::from_message("request limit reached").is_transient());
        assert!(!ProviderError::from_message("connection reset by peer").is_transient());
    }

    #[test]
    fn test_only_rate_limit_is_transient() {
        assert!(ProviderError::RateLimited("429".into()).is_transient());
        assert!(!ProviderError::Http("500".into()).is_transient());
        assert!(!ProviderError::InvalidResponse("bad json".into()).is_transient());
        assert!(!ProviderError::NoData.is_transient());
    }

    #[test]
    fn test_fetch_error_propagates_into_app_error() {
        fn run() -> Result<()> {
            Err::<(), _>(FetchError::Exhausted {
                attempts: 3,
                last: ProviderError::RateLimited("HTTP 429".into()),
            })?;
            Ok(())
        }

        let err = run().unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::Exhausted { attempts: 3, .. })));
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
