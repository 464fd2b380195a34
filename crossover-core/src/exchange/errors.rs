// =================================================================
// exchange/errors.rs - Error Types
// =================================================================

use thiserror::Error;

/// Error types for market data requests
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Exchange API error: {0}")]
    ApiError(String),
}

impl ExchangeError {
    /// Whether the same request may succeed if sent again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_)
                | ExchangeError::RateLimit(_)
                | ExchangeError::ServerError(_)
                | ExchangeError::Timeout
        )
    }
}

// Convert from common error types
impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_connect() || err.is_request() {
            ExchangeError::NetworkError(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::ApiError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ExchangeError::Timeout.is_transient());
        assert!(ExchangeError::RateLimit("429".into()).is_transient());
        assert!(ExchangeError::ServerError("503".into()).is_transient());
        assert!(!ExchangeError::Unauthorized("401".into()).is_transient());
        assert!(!ExchangeError::ParseError("bad json".into()).is_transient());
        assert!(!ExchangeError::InvalidSymbol("".into()).is_transient());
    }
}
