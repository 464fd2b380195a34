// crossover-core/src/backtest/engine.rs

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use tracing::{debug, info};

use super::metrics::MetricsCalculator;
use super::{types::*, BacktestError, SignalSeries, Strategy};
use crossover_common::data::PriceSeries;

/// Single-symbol, long-only, all-in backtester.
///
/// A signal seen on bar `t` fills at the price of bar `t + 1`; signals on the
/// final bar have nothing to fill against and are dropped.
pub struct BacktestEngine {
    config: BacktestConfig,
    portfolio: Portfolio,
    fills: Vec<Fill>,
    trades: Vec<Trade>,
    metrics_calculator: MetricsCalculator,
    equity_points: Vec<EquityPoint>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        let portfolio = Portfolio::new(config.initial_capital);
        let metrics_calculator = MetricsCalculator::new(config.periods_per_year, config.risk_free_rate);

        Self {
            config,
            portfolio,
            fills: Vec::new(),
            trades: Vec::new(),
            metrics_calculator,
            equity_points: Vec::new(),
        }
    }

    pub fn run_strategy(
        &mut self,
        strategy: &dyn Strategy,
        series: &PriceSeries,
    ) -> Result<BacktestResult, BacktestError> {
        info!("Starting backtest of '{}' for {}", strategy.name(), self.config.symbol);

        let signals = strategy.generate_signals(series);
        self.run_signals(strategy, series, &signals)
    }

    /// Run already generated `signals`; `strategy` only names the result
    pub fn run_signals(
        &mut self,
        strategy: &dyn Strategy,
        series: &PriceSeries,
        signals: &SignalSeries,
    ) -> Result<BacktestResult, BacktestError> {
        info!(
            "Running {} entry bars out of {} for {}",
            signals.entry_count(),
            signals.len(),
            self.config.symbol
        );

        self.simulate(series, signals)?;

        info!("Backtest completed. Calculating metrics...");
        let metrics = self.metrics_calculator.calculate(
            &self.trades,
            &self.fills,
            &self.equity_points,
            &self.config,
        );

        Ok(BacktestResult {
            strategy_name: strategy.name().to_string(),
            parameters: strategy.parameters(),
            metrics,
            trades: self.trades.clone(),
            fills: self.fills.clone(),
            equity_curve: self.equity_points.clone(),
        })
    }

    /// Walk the series bar by bar, filling orders decided on the previous bar
    pub fn simulate(&mut self, series: &PriceSeries, signals: &SignalSeries) -> Result<(), BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::EmptySeries);
        }
        if signals.entries.len() != series.len() || signals.exits.len() != series.len() {
            return Err(BacktestError::LengthMismatch {
                prices: series.len(),
                signals: signals.entries.len().min(signals.exits.len()),
            });
        }

        let prices = to_decimal_prices(series.prices())?;
        self.reset();

        let last = series.len() - 1;
        let mut pending: Option<OrderSide> = None;

        for (i, (timestamp, price)) in series.timestamps().iter().zip(&prices).enumerate() {
            if let Some(side) = pending.take() {
                self.execute_order(side, *timestamp, *price);
            }

            self.update_portfolio_value(*price);
            self.record_equity_point(*timestamp, series.prices()[i]);

            if i < last {
                pending = match self.portfolio.state() {
                    PositionState::Flat if signals.entries[i] => Some(OrderSide::Buy),
                    PositionState::Long if signals.exits[i] => Some(OrderSide::Sell),
                    _ => None,
                };
            }
        }

        if let Some(open) = self.open_trade(prices[last]) {
            debug!("Position still open at end of data: pnl {}", open.pnl);
            self.trades.push(open);
        }

        info!(
            "Simulated {} bars: {} fills, {} trades",
            series.len(),
            self.fills.len(),
            self.trades.len()
        );
        Ok(())
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    fn reset(&mut self) {
        self.portfolio = Portfolio::new(self.config.initial_capital);
        self.fills.clear();
        self.trades.clear();
        self.equity_points.clear();
    }

    fn execute_order(&mut self, side: OrderSide, timestamp: DateTime<Utc>, price: Decimal) {
        let rate = self.config.commission_rate;

        match side {
            OrderSide::Buy => {
                let cash = self.portfolio.cash;
                let notional = cash / (Decimal::ONE + rate);
                let commission = cash - notional;
                let quantity = notional / price;

                self.portfolio.cash = Decimal::ZERO;
                self.portfolio.position = Some(Position {
                    quantity,
                    entry_price: price,
                    entry_time: timestamp,
                    cost: cash,
                    entry_commission: commission,
                });

                debug!("{} BUY {} @ {}", timestamp, quantity, price);
                self.fills.push(Fill {
                    timestamp,
                    side,
                    quantity,
                    price,
                    commission,
                });
            }
            OrderSide::Sell => {
                let Some(position) = self.portfolio.position.take() else {
                    return;
                };

                let proceeds = position.quantity * price;
                let commission = proceeds * rate;
                let net = proceeds - commission;
                self.portfolio.cash += net;

                let pnl = net - position.cost;
                self.trades.push(Trade {
                    entry_time: position.entry_time,
                    entry_price: position.entry_price,
                    exit_time: Some(timestamp),
                    exit_price: Some(price),
                    quantity: position.quantity,
                    fees: position.entry_commission + commission,
                    pnl,
                    return_pct: percent_of(pnl, position.cost),
                });

                debug!("{} SELL {} @ {} (pnl {})", timestamp, position.quantity, price, pnl);
                self.fills.push(Fill {
                    timestamp,
                    side,
                    quantity: position.quantity,
                    price,
                    commission,
                });
            }
        }
    }

    /// Unrealized round trip for a position left open, marked at `price`
    fn open_trade(&self, price: Decimal) -> Option<Trade> {
        let position = self.portfolio.position.as_ref()?;
        let pnl = position.quantity * price - position.cost;

        Some(Trade {
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time: None,
            exit_price: None,
            quantity: position.quantity,
            fees: position.entry_commission,
            pnl,
            return_pct: percent_of(pnl, position.cost),
        })
    }

    fn update_portfolio_value(&mut self, price: Decimal) {
        let position_value = self
            .portfolio
            .position
            .as_ref()
            .map(|p| p.quantity * price)
            .unwrap_or(Decimal::ZERO);

        self.portfolio.total_value = self.portfolio.cash + position_value;
    }

    fn record_equity_point(&mut self, timestamp: DateTime<Utc>, price: f64) {
        self.equity_points.push(EquityPoint {
            timestamp,
            value: self.portfolio.total_value,
            price,
            state: self.portfolio.state(),
        });
    }
}

fn to_decimal_prices(prices: &[f64]) -> Result<Vec<Decimal>, BacktestError> {
    prices
        .iter()
        .enumerate()
        .map(|(index, &price)| {
            Decimal::from_f64(price)
                .filter(|p| *p > Decimal::ZERO)
                .ok_or(BacktestError::InvalidPrice { index, price })
        })
        .collect()
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let timestamps = (0..prices.len())
            .map(|i| start + Duration::minutes(i as i64))
            .collect();
        PriceSeries::new("SPY", timestamps, prices.to_vec()).unwrap()
    }

    fn signals(entries: &[bool]) -> SignalSeries {
        SignalSeries {
            entries: entries.to_vec(),
            exits: entries.iter().map(|e| !e).collect(),
        }
    }

    fn engine(commission_rate: Decimal) -> BacktestEngine {
        BacktestEngine::new(BacktestConfig {
            symbol: "SPY".to_string(),
            initial_capital: dec!(1000),
            commission_rate,
            periods_per_year: 98_280.0,
            risk_free_rate: 0.0,
        })
    }

    #[test]
    fn test_fills_at_next_bar_price() {
        let mut engine = engine(Decimal::ZERO);
        let prices = [10.0, 20.0, 40.0, 25.0];
        let series = series(&prices);
        engine
            .simulate(&series, &signals(&[true, false, false, false]))
            .unwrap();

        assert_eq!(engine.fills.len(), 2);
        assert_eq!(engine.fills[0].side, OrderSide::Buy);
        assert_eq!(engine.fills[0].price, dec!(20));
        assert_eq!(engine.fills[0].quantity, dec!(50));
        assert_eq!(engine.fills[1].side, OrderSide::Sell);
        assert_eq!(engine.fills[1].price, dec!(40));
        assert_eq!(engine.fills[1].timestamp, series.timestamps()[2]);

        let trade = &engine.trades[0];
        assert!(trade.is_closed());
        assert_eq!(trade.pnl, dec!(1000));
        assert_eq!(trade.return_pct, dec!(100));
        assert_eq!(engine.portfolio().cash, dec!(2000));
    }

    #[test]
    fn test_repeated_signals_are_no_ops() {
        let mut engine = engine(Decimal::ZERO);
        let prices = [10.0, 10.0, 11.0, 12.0, 13.0, 12.0, 11.0];
        engine
            .simulate(
                &series(&prices),
                &signals(&[true, true, true, false, false, false, false]),
            )
            .unwrap();

        let sides: Vec<_> = engine.fills.iter().map(|f| f.side).collect();
        assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
        assert_eq!(engine.fills[0].timestamp, series(&prices).timestamps()[1]);
        assert_eq!(engine.fills[1].timestamp, series(&prices).timestamps()[4]);
    }

    #[test]
    fn test_last_bar_signal_is_dropped() {
        let mut engine = engine(Decimal::ZERO);
        engine
            .simulate(&series(&[10.0, 11.0, 12.0]), &signals(&[false, false, true]))
            .unwrap();

        assert!(engine.fills.is_empty());
        assert!(engine.trades.is_empty());
        assert_eq!(engine.portfolio().total_value, dec!(1000));
    }

    #[test]
    fn test_open_position_reported_at_end() {
        let mut engine = engine(Decimal::ZERO);
        engine
            .simulate(&series(&[10.0, 10.0, 12.5]), &signals(&[true, true, true]))
            .unwrap();

        assert_eq!(engine.trades.len(), 1);
        let open = &engine.trades[0];
        assert!(!open.is_closed());
        assert_eq!(open.pnl, dec!(250));
        assert_eq!(engine.portfolio().state(), PositionState::Long);
        assert_eq!(engine.equity_points.last().unwrap().value, dec!(1250));
    }

    #[test]
    fn test_commission_charged_on_both_fills() {
        let mut engine = engine(dec!(0.01));
        engine
            .simulate(&series(&[10.0, 10.0, 10.0, 10.0]), &signals(&[true, false, false, false]))
            .unwrap();

        let fees: Decimal = engine.fills.iter().map(|f| f.commission).sum();
        let trade = &engine.trades[0];
        assert!(trade.pnl < Decimal::ZERO);
        assert_eq!(trade.fees, fees);
        assert!((engine.portfolio().cash + fees - dec!(1000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_equity_tracks_every_bar() {
        let mut engine = engine(Decimal::ZERO);
        let prices = [10.0, 10.0, 15.0, 5.0];
        engine
            .simulate(&series(&prices), &signals(&[true, true, true, true]))
            .unwrap();

        let values: Vec<Decimal> = engine.equity_points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(1000), dec!(1000), dec!(1500), dec!(500)]);
        assert_eq!(engine.equity_points[0].state, PositionState::Flat);
        assert_eq!(engine.equity_points[1].state, PositionState::Long);
    }

    #[test]
    fn test_run_signals_uses_given_signals() {
        use crate::backtest::MacdStochasticStrategy;

        // Constant prices never produce an entry on their own
        let flat = series(&[10.0; 40]);
        let strategy = MacdStochasticStrategy::default();
        assert_eq!(strategy.generate_signals(&flat).entry_count(), 0);

        let mut entries = vec![false; 40];
        entries[5] = true;
        let given = signals(&entries);

        let mut engine = engine(Decimal::ZERO);
        let result = engine.run_signals(&strategy, &flat, &given).unwrap();

        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].timestamp, flat.timestamps()[6]);
        assert_eq!(result.fills[1].timestamp, flat.timestamps()[7]);
        assert_eq!(result.metrics.closed_trades, 1);
        assert_eq!(result.strategy_name, strategy.name());
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut engine = engine(Decimal::ZERO);
        assert!(matches!(
            engine.simulate(&PriceSeries::empty("SPY"), &signals(&[])),
            Err(BacktestError::EmptySeries)
        ));
        assert!(matches!(
            engine.simulate(&series(&[1.0, 2.0]), &signals(&[true])),
            Err(BacktestError::LengthMismatch { prices: 2, signals: 1 })
        ));
        assert!(matches!(
            engine.simulate(&series(&[1.0, 0.0]), &signals(&[true, false])),
            Err(BacktestError::InvalidPrice { index: 1, .. })
        ));
    }
}
