// =================================================================
// data/types.rs - Market Data Types
// =================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building, loading or persisting market data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),
}

pub type DataResult<T> = Result<T, DataError>;

/// One OHLCV sample for a one-minute interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: Option<u64>,
    pub vwap: Option<f64>,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            volume,
            trade_count: None,
            vwap: None,
        }
    }
}

/// Closing prices of a single symbol.
///
/// Timestamps are strictly increasing and every price is finite; both are
/// checked on construction, after which the series is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    timestamps: Vec<DateTime<Utc>>,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        timestamps: Vec<DateTime<Utc>>,
        prices: Vec<f64>,
    ) -> DataResult<Self> {
        if timestamps.len() != prices.len() {
            return Err(DataError::InvalidSeries(format!(
                "{} timestamps but {} prices",
                timestamps.len(),
                prices.len()
            )));
        }

        if let Some(i) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidSeries(format!(
                "timestamps not strictly increasing at index {}: {} >= {}",
                i + 1,
                timestamps[i],
                timestamps[i + 1]
            )));
        }

        if let Some(i) = prices.iter().position(|p| !p.is_finite()) {
            return Err(DataError::InvalidSeries(format!(
                "non-finite price {} at index {}",
                prices[i], i
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            timestamps,
            prices,
        })
    }

    /// Build a close-price series from bars, keeping bar order
    pub fn from_bars(symbol: impl Into<String>, bars: &[Bar]) -> DataResult<Self> {
        let timestamps = bars.iter().map(|b| b.timestamp).collect();
        let prices = bars.iter().map(|b| b.close).collect();
        Self::new(symbol, timestamps, prices)
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamps: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn first(&self) -> Option<(DateTime<Utc>, f64)> {
        Some((*self.timestamps.first()?, *self.prices.first()?))
    }

    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        Some((*self.timestamps.last()?, *self.prices.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.prices.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn minutes(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        (0..n).map(|i| start + Duration::minutes(i as i64)).collect()
    }

    #[test]
    fn test_series_accepts_ordered_input() {
        let series = PriceSeries::new("SPY", minutes(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.last().unwrap().1, 3.0);
    }

    #[test]
    fn test_series_rejects_unordered_timestamps() {
        let mut ts = minutes(3);
        ts.swap(1, 2);
        let err = PriceSeries::new("SPY", ts, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, DataError::InvalidSeries(_)));
    }

    #[test]
    fn test_series_rejects_duplicate_timestamps() {
        let mut ts = minutes(2);
        ts[1] = ts[0];
        assert!(PriceSeries::new("SPY", ts, vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_series_rejects_nan_and_length_mismatch() {
        assert!(PriceSeries::new("SPY", minutes(2), vec![1.0, f64::NAN]).is_err());
        assert!(PriceSeries::new("SPY", minutes(2), vec![1.0]).is_err());
    }

    #[test]
    fn test_from_bars_takes_close() {
        let bars: Vec<Bar> = minutes(2)
            .into_iter()
            .zip([10.5, 11.25])
            .map(|(ts, close)| Bar::new(ts, "SPY", close - 1.0, close + 1.0, close - 2.0, close, 100.0))
            .collect();

        let series = PriceSeries::from_bars("SPY", &bars).unwrap();
        assert_eq!(series.prices(), &[10.5, 11.25]);
        assert_eq!(series.timestamps()[0], bars[0].timestamp);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty("SPY");
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }
}
