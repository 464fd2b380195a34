use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Market {
    /// Ticker of the fund to backtest
    pub symbol: String,
    /// Lookback window ending now, in days
    pub days: i64,
    /// Alpaca data feed ("iex", "sip"); the account default when unset
    pub feed: Option<String>,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            days: 365,
            feed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Alpaca {
    pub key_id: String,
    pub secret_key: String,
    pub data_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub page_limit: u32,
}

impl Default for Alpaca {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            secret_key: String::new(),
            data_url: "https://data.alpaca.markets".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            page_limit: 10_000,
        }
    }
}

impl Alpaca {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub dir: String,
    /// Unset means any existing cache file is used as-is
    pub max_age_hours: Option<u64>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            max_age_hours: None,
        }
    }
}

impl Cache {
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_hours.map(|h| Duration::from_secs(h.saturating_mul(3600)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Indicators {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
}

impl Default for Indicators {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_k: 14,
            stoch_d: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Backtest {
    pub initial_capital: Decimal,
    pub commission_rate: Decimal,
    /// Bars per year used to annualize Sharpe/Sortino (252 sessions x 390 minutes)
    pub periods_per_year: f64,
    pub risk_free_rate: f64,
}

impl Default for Backtest {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(10_000),
            commission_rate: Decimal::ZERO,
            periods_per_year: 252.0 * 390.0,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Report {
    /// Defaults to `<SYMBOL>_backtest.html` when unset
    pub chart_path: Option<String>,
    pub serve_port: u16,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            chart_path: None,
            serve_port: 3000,
        }
    }
}

impl Report {
    pub fn chart_path_for(&self, symbol: &str) -> String {
        self.chart_path
            .clone()
            .unwrap_or_else(|| format!("{}_backtest.html", symbol))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub market: Market,
    pub alpaca: Alpaca,
    pub cache: Cache,
    pub indicators: Indicators,
    pub backtest: Backtest,
    pub report: Report,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("CROSSOVER").separator("__"));

        if let Ok(key_id) = std::env::var("APCA_API_KEY_ID") {
            builder = builder.set_override("alpaca.key_id", key_id)?;
        }
        if let Ok(secret_key) = std::env::var("APCA_API_SECRET_KEY") {
            builder = builder.set_override("alpaca.secret_key", secret_key)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("macd_fast", self.indicators.macd_fast),
            ("macd_slow", self.indicators.macd_slow),
            ("macd_signal", self.indicators.macd_signal),
            ("stoch_k", self.indicators.stoch_k),
            ("stoch_d", self.indicators.stoch_d),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(ConfigError::Message(format!(
                "indicators.{} must be at least 1",
                name
            )));
        }

        if self.market.symbol.trim().is_empty() {
            return Err(ConfigError::Message("market.symbol must not be empty".into()));
        }
        if self.market.days <= 0 {
            return Err(ConfigError::Message("market.days must be positive".into()));
        }
        if self.backtest.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "backtest.initial_capital must be positive".into(),
            ));
        }
        if self.backtest.commission_rate < Decimal::ZERO {
            return Err(ConfigError::Message(
                "backtest.commission_rate must not be negative".into(),
            ));
        }
        if self.backtest.periods_per_year <= 0.0 {
            return Err(ConfigError::Message(
                "backtest.periods_per_year must be positive".into(),
            ));
        }

        Ok(())
    }
}
