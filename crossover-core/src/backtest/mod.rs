pub mod engine;
pub mod errors;
pub mod metrics;
pub mod strategy;
pub mod types;

pub use engine::BacktestEngine;
pub use errors::BacktestError;
pub use metrics::MetricsCalculator;
pub use strategy::{MacdStochasticStrategy, SignalSeries, Strategy};
pub use types::*;
