pub mod types;
pub mod cache;

pub use types::{Bar, DataError, DataResult, PriceSeries};
pub use cache::{BarCache, CacheStatus};
