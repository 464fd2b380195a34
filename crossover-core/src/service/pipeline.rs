use tracing::info;

use super::{LoadedBars, ServiceError};
use crate::backtest::{BacktestConfig, BacktestEngine, BacktestResult, MacdStochasticStrategy, SignalSeries};
use crate::config::Settings;
use crate::indicators::IndicatorSet;
use crossover_common::data::PriceSeries;

/// Every stage output of one backtest run, kept for reporting
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
    pub signals: SignalSeries,
    pub result: BacktestResult,
}

/// Indicators, signals and simulation over already-loaded bars
pub fn run_backtest(loaded: &LoadedBars, settings: &Settings) -> Result<BacktestRun, ServiceError> {
    let series = PriceSeries::from_bars(&loaded.symbol, &loaded.bars)?;
    if series.is_empty() {
        return Err(ServiceError::Validation(format!("No bars to backtest for {}", loaded.symbol)));
    }

    let strategy = MacdStochasticStrategy::new(settings.indicators);
    info!("Computing indicators over {} bars", series.len());
    let indicators = strategy.indicators(&series);
    let signals = strategy.signals_from(&indicators);

    let config = BacktestConfig::from_settings(series.symbol(), &settings.backtest);
    let mut engine = BacktestEngine::new(config);
    let result = engine.run_signals(&strategy, &series, &signals)?;

    Ok(BacktestRun {
        series,
        indicators,
        signals,
        result,
    })
}
