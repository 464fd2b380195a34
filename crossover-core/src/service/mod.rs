pub mod errors;
pub mod market_data;
pub mod pipeline;
pub mod types;

// Re-export main interfaces
pub use errors::ServiceError;
pub use market_data::MarketDataService;
pub use pipeline::{run_backtest, BacktestRun};
pub use types::*;
