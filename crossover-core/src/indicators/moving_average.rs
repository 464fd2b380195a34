/// Simple moving average over a series that may contain undefined values.
///
/// `out[t]` is the mean of `values[t-window+1..=t]`, and `None` while fewer
/// than `window` values are available or any value in the window is `None`.
pub fn sma(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|t| {
            if t + 1 < window {
                return None;
            }
            values[t + 1 - window..=t]
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|sum| sum / window as f64)
        })
        .collect()
}

/// `sma` over raw prices
pub fn sma_of_prices(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
    sma(&values, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_uses_exactly_last_window_values() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
        let out = sma_of_prices(&prices, 3);
        assert_eq!(out, vec![None, None, Some(11.0), Some(12.0), Some(13.0)]);
    }

    #[test]
    fn test_sma_propagates_undefined_inputs() {
        let values = [None, Some(2.0), Some(4.0), Some(6.0)];
        let out = sma(&values, 2);
        assert_eq!(out, vec![None, None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn test_sma_window_longer_than_input() {
        assert!(sma_of_prices(&[1.0, 2.0], 5).iter().all(Option::is_none));
        assert!(sma_of_prices(&[], 5).is_empty());
        assert!(sma_of_prices(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn test_sma_window_of_one_is_identity() {
        let prices = [3.5, 1.25, 8.0];
        let out = sma_of_prices(&prices, 1);
        assert_eq!(out, vec![Some(3.5), Some(1.25), Some(8.0)]);
    }
}
