pub mod base;
pub mod macd_stochastic;

pub use base::{SignalSeries, Strategy};
pub use macd_stochastic::MacdStochasticStrategy;
