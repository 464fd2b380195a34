use thiserror::Error;

/// Backtest error types
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("No price data to backtest")]
    EmptySeries,

    #[error("Signal length {signals} does not match price length {prices}")]
    LengthMismatch { prices: usize, signals: usize },

    #[error("Invalid price {price} at index {index}")]
    InvalidPrice { index: usize, price: f64 },
}
