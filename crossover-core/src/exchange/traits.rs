// exchange/traits.rs

use super::{BarParams, ExchangeError};
use async_trait::async_trait;
use crossover_common::data::Bar;

/// Historical bar source that every brokerage implementation must follow
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the bars of `params.symbol` in `[start, end]`, ordered by timestamp
    async fn get_bars(&self, params: &BarParams) -> Result<Vec<Bar>, ExchangeError>;
}
