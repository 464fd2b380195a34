// exchange/mod.rs
pub mod traits;
pub mod types;
pub mod errors;
pub mod alpaca;
pub mod utils;

// Re-export main interfaces for easy access
pub use traits::MarketDataProvider;
pub use types::*;
pub use errors::ExchangeError;
pub use alpaca::AlpacaClient;
