use chrono::{DateTime, Utc};
use crossover_common::data::Bar;

/// Where a set of bars came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Exchange,
}

/// Bars for one symbol plus their provenance
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub origin: DataOrigin,
}

impl LoadedBars {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.bars.first()?.timestamp, self.bars.last()?.timestamp))
    }
}
