use crossover_common::data::PriceSeries;
use std::collections::BTreeMap;

/// Entry and exit flags aligned to the price index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSeries {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|e| **e).count()
    }
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> BTreeMap<String, String>;

    /// Derive entry/exit flags for every bar of `series`
    fn generate_signals(&self, series: &PriceSeries) -> SignalSeries;
}
