// =================================================================
// exchange/types.rs - Data Structures
// =================================================================

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::errors::ExchangeError;

/// Alpaca timeframe of every request; only one-minute bars are fetched
pub const MINUTE_TIMEFRAME: &str = "1Min";

/// Parameters for querying historical one-minute bars
#[derive(Debug, Clone)]
pub struct BarParams {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: Option<u32>,
    pub feed: Option<String>,
}

impl BarParams {
    pub fn new(symbol: String, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            start,
            end,
            limit: None,
            feed: None,
        }
    }

    /// Minute bars covering the last `days` days up to `now`
    pub fn lookback(symbol: String, days: i64, now: DateTime<Utc>) -> Result<Self, ExchangeError> {
        let start = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                ExchangeError::InvalidRange(format!("{} days before {} is out of range", days, now))
            })?;

        Ok(Self::new(symbol, start, now))
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_feed(mut self, feed: Option<String>) -> Self {
        self.feed = feed;
        self
    }
}

/// Alpaca bar format
#[derive(Debug, Deserialize, Clone)]
pub struct AlpacaBar {
    /// Bar start time
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "o")]
    pub open: f64,

    #[serde(rename = "h")]
    pub high: f64,

    #[serde(rename = "l")]
    pub low: f64,

    #[serde(rename = "c")]
    pub close: f64,

    #[serde(rename = "v")]
    pub volume: f64,

    /// Number of trades in the bar
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,

    /// Volume weighted average price
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

/// One page of the multi-symbol bars endpoint
#[derive(Debug, Deserialize)]
pub struct AlpacaBarsResponse {
    /// Bars keyed by symbol; `null` when the range holds no data
    #[serde(default)]
    pub bars: Option<HashMap<String, Vec<AlpacaBar>>>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Error body returned by Alpaca on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct AlpacaErrorMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bar_params_builder() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 21, 0, 0).unwrap();
        let params = BarParams::lookback("spy".to_string(), 365, now)
            .unwrap()
            .with_limit(500)
            .with_feed(Some("iex".to_string()));

        assert_eq!(params.symbol, "SPY");
        assert_eq!(params.end - params.start, Duration::days(365));
        assert_eq!(params.limit, Some(500));
        assert_eq!(params.feed.as_deref(), Some("iex"));
    }

    #[test]
    fn test_lookback_out_of_range_is_an_error() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 21, 0, 0).unwrap();
        for days in [1_000_000_000, i64::MAX] {
            let err = BarParams::lookback("SPY".to_string(), days, now).unwrap_err();
            assert!(matches!(err, ExchangeError::InvalidRange(_)), "days = {}", days);
        }
    }

    #[test]
    fn test_parse_bars_page() {
        let page = r#"{
            "bars": {
                "SPY": [
                    {"t": "2024-03-01T14:30:00Z", "o": 508.98, "h": 509.2, "l": 508.7, "c": 509.1, "v": 412345, "n": 3021, "vw": 508.95},
                    {"t": "2024-03-01T14:31:00Z", "o": 509.1, "h": 509.4, "l": 509.0, "c": 509.35, "v": 210001}
                ]
            },
            "next_page_token": "U1BZfE18MjAyNC0wMy0wMVQxNDozMTowMC4wMDAwMDAwMDBa"
        }"#;

        let response: AlpacaBarsResponse = serde_json::from_str(page).unwrap();
        let bars = &response.bars.as_ref().unwrap()["SPY"];
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].trade_count, Some(3021));
        assert_eq!(bars[1].vwap, None);
        assert_eq!(bars[1].close, 509.35);
        assert!(response.next_page_token.is_some());
    }

    #[test]
    fn test_parse_empty_page() {
        let response: AlpacaBarsResponse =
            serde_json::from_str(r#"{"bars": null, "next_page_token": null}"#).unwrap();
        assert!(response.bars.is_none());
        assert!(response.next_page_token.is_none());
    }
}
