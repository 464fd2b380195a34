use thiserror::Error;

use crate::backtest::BacktestError;
use crate::exchange::ExchangeError;
use crossover_common::data::DataError;

/// Service layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Backtest error: {0}")]
    Backtest(#[from] BacktestError),

    #[error("Validation error: {0}")]
    Validation(String),
}
