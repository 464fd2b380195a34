// crossover-core/src/backtest/types.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config;

// Base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub initial_capital: Decimal,
    /// Fraction of traded notional charged on every fill
    pub commission_rate: Decimal,
    pub periods_per_year: f64,
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn from_settings(symbol: impl Into<String>, settings: &config::Backtest) -> Self {
        Self {
            symbol: symbol.into(),
            initial_capital: settings.initial_capital,
            commission_rate: settings.commission_rate,
            periods_per_year: settings.periods_per_year,
            risk_free_rate: settings.risk_free_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Single-symbol position state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Long,
}

// Executed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
}

// Open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    /// Cash spent on entry, commission included
    pub cost: Decimal,
    pub entry_commission: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: Decimal,
    pub position: Option<Position>,
    pub total_value: Decimal,
}

impl Portfolio {
    pub fn new(cash: Decimal) -> Self {
        Self {
            cash,
            position: None,
            total_value: cash,
        }
    }

    pub fn state(&self) -> PositionState {
        if self.position.is_some() {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }
}

/// Round trip from entry to exit; `exit_*` is `None` while still open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub fees: Decimal,
    /// Net of fees; marked to the last price for open trades
    pub pnl: Decimal,
    pub return_pct: Decimal,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }
}

// Equity point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
    pub price: f64,
    pub state: PositionState,
}

// Backtest result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub parameters: BTreeMap<String, String>,
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<EquityPoint>,
}

// Performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bars: usize,
    pub start_value: Decimal,
    pub end_value: Decimal,

    // Returns
    pub total_return: Decimal,
    pub benchmark_return: Decimal,
    pub total_fees: Decimal,

    // Risk
    pub max_drawdown: Decimal,
    pub max_drawdown_duration: i64, // seconds
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub exposure: Decimal,

    // Trades
    pub total_trades: u32,
    pub closed_trades: u32,
    pub open_trades: u32,
    pub open_trade_pnl: Decimal,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: Decimal,
    pub best_trade: Option<Decimal>,
    pub worst_trade: Option<Decimal>,
    pub avg_winning_trade: Option<Decimal>,
    pub avg_losing_trade: Option<Decimal>,
    /// Gross profit over gross loss; `None` when nothing was lost
    pub profit_factor: Option<Decimal>,
    pub expectancy: Decimal,
    pub avg_trade_duration: i64, // seconds
}
