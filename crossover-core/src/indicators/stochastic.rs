use super::moving_average::sma;

/// Stochastic oscillator %K and its smoothed %D
#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// %K over a trailing `window`.
///
/// Undefined during warmup and when the window is flat (max == min), so a
/// constant stretch of prices produces no value instead of dividing by zero.
pub fn stochastic_k(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; prices.len()];
    }

    (0..prices.len())
        .map(|t| {
            if t + 1 < window {
                return None;
            }
            let slice = &prices[t + 1 - window..=t];
            let low = slice.iter().copied().fold(f64::INFINITY, f64::min);
            let high = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = high - low;
            if range == 0.0 {
                None
            } else {
                Some((prices[t] - low) / range * 100.0)
            }
        })
        .collect()
}

pub fn stochastic(prices: &[f64], k_window: usize, d_window: usize) -> Stochastic {
    let k = stochastic_k(prices, k_window);
    let d = sma(&k, d_window);
    Stochastic { k, d }
}
