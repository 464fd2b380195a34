// =================================================================
// indicators/mod.rs - Indicator Engine
// =================================================================

pub mod moving_average;
pub mod macd;
pub mod stochastic;

pub use macd::{macd, Macd};
pub use moving_average::{sma, sma_of_prices};
pub use stochastic::{stochastic, Stochastic};

use crate::config::Indicators;

/// Indicator values aligned to the price index; `None` marks an undefined bar
pub type DerivedSeries = Vec<Option<f64>>;

/// The four derived series consumed by the signal generator
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub macd: DerivedSeries,
    pub signal: DerivedSeries,
    pub stoch_k: DerivedSeries,
    pub stoch_d: DerivedSeries,
}

impl IndicatorSet {
    pub fn compute(prices: &[f64], windows: &Indicators) -> Self {
        let Macd { line, signal } = macd(
            prices,
            windows.macd_fast,
            windows.macd_slow,
            windows.macd_signal,
        );
        let Stochastic { k, d } = stochastic(prices, windows.stoch_k, windows.stoch_d);

        Self {
            macd: line,
            signal,
            stoch_k: k,
            stoch_d: d,
        }
    }

    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// MACD line above its signal line
    pub fn macd_crossover(&self) -> Vec<bool> {
        above(&self.macd, &self.signal)
    }

    /// %K above %D
    pub fn stochastic_crossover(&self) -> Vec<bool> {
        above(&self.stoch_k, &self.stoch_d)
    }
}

/// Elementwise `a > b`; false wherever either side is undefined
pub fn above(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<bool> {
    a.iter()
        .zip(b)
        .map(|(x, y)| matches!((x, y), (Some(x), Some(y)) if x > y))
        .collect()
}
