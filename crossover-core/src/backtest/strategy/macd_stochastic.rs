// crossover-core/src/backtest/strategy/macd_stochastic.rs

use std::collections::BTreeMap;

use crossover_common::data::PriceSeries;

use super::base::{SignalSeries, Strategy};
use crate::config::Indicators;
use crate::indicators::IndicatorSet;

/// Long when the MACD line is above its signal line and %K is above %D.
///
/// Exit policy: every bar that is not an entry is an exit, so a position is
/// closed as soon as either condition lapses. There is no debounce, holding
/// period or cooldown; the flags may flip on every bar.
pub struct MacdStochasticStrategy {
    windows: Indicators,
}

impl MacdStochasticStrategy {
    pub fn new(windows: Indicators) -> Self {
        Self { windows }
    }

    pub fn indicators(&self, series: &PriceSeries) -> IndicatorSet {
        IndicatorSet::compute(series.prices(), &self.windows)
    }

    pub fn signals_from(&self, indicators: &IndicatorSet) -> SignalSeries {
        let entries: Vec<bool> = indicators
            .macd_crossover()
            .into_iter()
            .zip(indicators.stochastic_crossover())
            .map(|(macd, stoch)| macd && stoch)
            .collect();
        let exits = exits_from_entries(&entries);

        SignalSeries { entries, exits }
    }
}

impl Default for MacdStochasticStrategy {
    fn default() -> Self {
        Self::new(Indicators::default())
    }
}

/// Exit on every bar that is not an entry
pub fn exits_from_entries(entries: &[bool]) -> Vec<bool> {
    entries.iter().map(|e| !e).collect()
}

impl Strategy for MacdStochasticStrategy {
    fn name(&self) -> &str {
        "MACD + Stochastic crossover"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        let w = &self.windows;
        [
            ("macd_fast", w.macd_fast),
            ("macd_slow", w.macd_slow),
            ("macd_signal", w.macd_signal),
            ("stoch_k", w.stoch_k),
            ("stoch_d", w.stoch_d),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn generate_signals(&self, series: &PriceSeries) -> SignalSeries {
        self.signals_from(&self.indicators(series))
    }
}
