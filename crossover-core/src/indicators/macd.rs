use super::moving_average::{sma, sma_of_prices};

/// MACD built from simple moving averages.
///
/// `line = SMA(fast) - SMA(slow)` and `signal = SMA(line, signal)`. The
/// conventional definition uses exponential averages; this one does not.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ma = sma_of_prices(prices, fast);
    let slow_ma = sma_of_prices(prices, slow);

    let line: Vec<Option<f64>> = fast_ma
        .iter()
        .zip(&slow_ma)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = sma(&line, signal);

    Macd { line, signal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_warmup_lengths() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let Macd { line, signal } = macd(&prices, 12, 26, 9);

        assert_eq!(line.len(), 40);
        assert_eq!(line.iter().position(Option::is_some), Some(25));
        assert_eq!(signal.iter().position(Option::is_some), Some(33));
    }

    #[test]
    fn test_macd_line_is_difference_of_averages() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let Macd { line, signal } = macd(&prices, 2, 4, 2);

        // SMA(2) - SMA(4) on a unit ramp is (4 - 2) / 2
        assert_eq!(line, vec![None, None, None, Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(signal, vec![None, None, None, None, Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_accelerating_rise_keeps_macd_above_signal() {
        let prices: Vec<f64> = (0..60).map(|t| 10.0 + 0.01 * (t * t) as f64).collect();
        let Macd { line, signal } = macd(&prices, 12, 26, 9);

        for t in 33..60 {
            assert!(line[t].unwrap() > signal[t].unwrap(), "bar {}", t);
        }
    }
}
