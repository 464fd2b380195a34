// crossover-core/src/backtest/metrics.rs

use super::types::*;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::*;

pub struct MetricsCalculator {
    periods_per_year: f64,
    /// Annual rate, spread evenly over `periods_per_year`
    risk_free_rate: f64,
}

impl MetricsCalculator {
    pub fn new(periods_per_year: f64, risk_free_rate: f64) -> Self {
        Self {
            periods_per_year,
            risk_free_rate,
        }
    }

    pub fn calculate(
        &self,
        trades: &[Trade],
        fills: &[Fill],
        equity_points: &[EquityPoint],
        config: &BacktestConfig,
    ) -> Metrics {
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
        let (winners, losers): (Vec<&Trade>, Vec<&Trade>) =
            closed.iter().partition(|t| t.pnl > Decimal::ZERO);
        let returns = self.calculate_returns(equity_points);
        let (max_drawdown, max_drawdown_duration) = self.calculate_drawdown(equity_points);

        let start_value = equity_points
            .first()
            .map(|p| p.value)
            .unwrap_or(config.initial_capital);
        let end_value = equity_points.last().map(|p| p.value).unwrap_or(start_value);

        let closed_returns: Vec<Decimal> = closed.iter().map(|t| t.return_pct).collect();
        let winner_returns: Vec<Decimal> = winners.iter().map(|t| t.return_pct).collect();
        let loser_returns: Vec<Decimal> = losers.iter().map(|t| t.return_pct).collect();

        Metrics {
            start: equity_points.first().map(|p| p.timestamp).unwrap_or_default(),
            end: equity_points.last().map(|p| p.timestamp).unwrap_or_default(),
            bars: equity_points.len(),
            start_value,
            end_value,

            total_return: percent_change(start_value, end_value),
            benchmark_return: self.calculate_benchmark_return(equity_points),
            total_fees: fills.iter().map(|f| f.commission).sum(),

            max_drawdown,
            max_drawdown_duration: max_drawdown_duration.num_seconds(),
            sharpe_ratio: self.calculate_sharpe_ratio(&returns),
            sortino_ratio: self.calculate_sortino_ratio(&returns),
            exposure: self.calculate_exposure(equity_points),

            total_trades: trades.len() as u32,
            closed_trades: closed.len() as u32,
            open_trades: (trades.len() - closed.len()) as u32,
            open_trade_pnl: trades.iter().filter(|t| !t.is_closed()).map(|t| t.pnl).sum(),
            winning_trades: winners.len() as u32,
            losing_trades: losers.len() as u32,
            win_rate: self.calculate_win_rate(winners.len(), closed.len()),
            best_trade: closed_returns.iter().max().copied(),
            worst_trade: closed_returns.iter().min().copied(),
            avg_winning_trade: mean(&winner_returns),
            avg_losing_trade: mean(&loser_returns),
            profit_factor: self.calculate_profit_factor(&winners, &losers),
            expectancy: self.calculate_expectancy(&closed),
            avg_trade_duration: self.calculate_avg_trade_duration(&closed),
        }
    }

    /// Simple per-bar returns of the equity curve
    pub fn calculate_returns(&self, equity_points: &[EquityPoint]) -> Vec<f64> {
        equity_points
            .windows(2)
            .map(|window| {
                let prev_value = window[0].value;
                let curr_value = window[1].value;
                if prev_value.is_zero() {
                    0.0
                } else {
                    ((curr_value - prev_value) / prev_value).to_f64().unwrap_or_default()
                }
            })
            .collect()
    }

    /// Deepest peak-to-trough loss in percent, and the longest time spent
    /// below a previous peak
    pub fn calculate_drawdown(&self, equity_points: &[EquityPoint]) -> (Decimal, Duration) {
        let mut max_drawdown = Decimal::ZERO;
        let mut max_duration = Duration::zero();
        let Some(first) = equity_points.first() else {
            return (max_drawdown, max_duration);
        };

        let mut peak_value = first.value;
        let mut peak_time = first.timestamp;

        for point in equity_points {
            if point.value >= peak_value {
                peak_value = point.value;
                peak_time = point.timestamp;
                continue;
            }

            if peak_value > Decimal::ZERO {
                let drawdown = (peak_value - point.value) / peak_value * Decimal::ONE_HUNDRED;
                max_drawdown = max_drawdown.max(drawdown);
            }
            max_duration = max_duration.max(point.timestamp - peak_time);
        }

        (max_drawdown, max_duration)
    }

    /// Buy-and-hold return over the same bars
    fn calculate_benchmark_return(&self, equity_points: &[EquityPoint]) -> Decimal {
        let (Some(first), Some(last)) = (equity_points.first(), equity_points.last()) else {
            return Decimal::ZERO;
        };

        match (Decimal::from_f64(first.price), Decimal::from_f64(last.price)) {
            (Some(first), Some(last)) => percent_change(first, last),
            _ => Decimal::ZERO,
        }
    }

    fn calculate_exposure(&self, equity_points: &[EquityPoint]) -> Decimal {
        if equity_points.is_empty() {
            return Decimal::ZERO;
        }

        let long = equity_points
            .iter()
            .filter(|p| p.state == PositionState::Long)
            .count();
        Decimal::from(long) / Decimal::from(equity_points.len()) * Decimal::ONE_HUNDRED
    }

    fn calculate_win_rate(&self, winning_trades: usize, closed_trades: usize) -> Decimal {
        if closed_trades == 0 {
            return Decimal::ZERO;
        }

        Decimal::from(winning_trades) / Decimal::from(closed_trades) * Decimal::ONE_HUNDRED
    }

    fn calculate_profit_factor(&self, winners: &[&Trade], losers: &[&Trade]) -> Option<Decimal> {
        let gross_profit: Decimal = winners.iter().map(|t| t.pnl).sum();
        let gross_loss: Decimal = losers.iter().map(|t| t.pnl.abs()).sum();

        if gross_loss.is_zero() {
            return None;
        }

        Some(gross_profit / gross_loss)
    }

    /// Mean net PnL per closed trade
    fn calculate_expectancy(&self, closed: &[&Trade]) -> Decimal {
        if closed.is_empty() {
            return Decimal::ZERO;
        }

        closed.iter().map(|t| t.pnl).sum::<Decimal>() / Decimal::from(closed.len())
    }

    fn calculate_avg_trade_duration(&self, closed: &[&Trade]) -> i64 {
        let durations: Vec<i64> = closed
            .iter()
            .filter_map(|t| t.exit_time.map(|exit| seconds_between(t.entry_time, exit)))
            .collect();

        if durations.is_empty() {
            return 0;
        }

        durations.iter().sum::<i64>() / durations.len() as i64
    }

    fn risk_free_per_period(&self) -> f64 {
        self.risk_free_rate / self.periods_per_year
    }

    pub fn calculate_sharpe_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let excess: Vec<f64> = returns.iter().map(|r| r - self.risk_free_per_period()).collect();
        let mean_return = excess.iter().sum::<f64>() / excess.len() as f64;
        let variance = excess
            .iter()
            .map(|r| (r - mean_return).powi(2))
            .sum::<f64>()
            / (excess.len() - 1) as f64;
        let volatility = variance.sqrt();

        if volatility == 0.0 || !volatility.is_finite() {
            return 0.0;
        }

        mean_return / volatility * self.periods_per_year.sqrt()
    }

    pub fn calculate_sortino_ratio(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let excess: Vec<f64> = returns.iter().map(|r| r - self.risk_free_per_period()).collect();
        let mean_return = excess.iter().sum::<f64>() / excess.len() as f64;
        let downside_deviation = (excess
            .iter()
            .map(|r| r.min(0.0).powi(2))
            .sum::<f64>()
            / excess.len() as f64)
            .sqrt();

        if downside_deviation == 0.0 || !downside_deviation.is_finite() {
            return 0.0;
        }

        mean_return / downside_deviation * self.periods_per_year.sqrt()
    }
}

fn percent_change(from: Decimal, to: Decimal) -> Decimal {
    if from.is_zero() {
        return Decimal::ZERO;
    }

    (to - from) / from * Decimal::ONE_HUNDRED
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds()
}
