// =================================================================
// exchange/utils.rs - Utility Functions
// =================================================================

use super::{AlpacaBar, AlpacaBarsResponse, BarParams, ExchangeError, MINUTE_TIMEFRAME};
use crossover_common::data::Bar;
use tracing::debug;

/// Convert an Alpaca bar to the standard Bar format
pub fn convert_alpaca_bar(symbol: &str, bar: AlpacaBar) -> Result<Bar, ExchangeError> {
    let prices = [bar.open, bar.high, bar.low, bar.close];
    if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
        return Err(ExchangeError::ParseError(format!(
            "Non-positive price in bar at {}",
            bar.timestamp
        )));
    }

    if bar.high < bar.low {
        return Err(ExchangeError::ParseError(format!(
            "High {} below low {} at {}",
            bar.high, bar.low, bar.timestamp
        )));
    }

    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(ExchangeError::ParseError(format!(
            "Invalid volume {} at {}",
            bar.volume, bar.timestamp
        )));
    }

    Ok(Bar {
        timestamp: bar.timestamp,
        symbol: symbol.to_string(),
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume,
        trade_count: bar.trade_count,
        vwap: bar.vwap,
    })
}

/// Validate symbol format for US equities and ETFs
pub fn validate_symbol(symbol: &str) -> Result<String, ExchangeError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ExchangeError::InvalidSymbol("Symbol cannot be empty".to_string()));
    }

    let symbol = symbol.to_uppercase();

    if !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        return Err(ExchangeError::InvalidSymbol(format!(
            "Symbol '{}' contains invalid characters",
            symbol
        )));
    }

    if symbol.len() > 10 {
        return Err(ExchangeError::InvalidSymbol(format!(
            "Symbol '{}' has invalid length",
            symbol
        )));
    }

    Ok(symbol)
}

/// Keep only the requested symbol from a multi-symbol page
pub fn select_symbol_bars(response: &mut AlpacaBarsResponse, symbol: &str) -> Vec<AlpacaBar> {
    let Some(bars) = response.bars.as_mut() else {
        return Vec::new();
    };

    let others: Vec<&String> = bars.keys().filter(|k| k.as_str() != symbol).collect();
    if !others.is_empty() {
        debug!("Dropping bars for unrequested symbols: {:?}", others);
    }

    bars.remove(symbol).unwrap_or_default()
}

/// Build the query string pairs for one page request
pub fn build_bars_query(params: &BarParams, page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("symbols", params.symbol.clone()),
        ("timeframe", MINUTE_TIMEFRAME.to_string()),
        ("start", params.start.to_rfc3339()),
        ("end", params.end.to_rfc3339()),
    ];

    if let Some(limit) = params.limit {
        query.push(("limit", limit.to_string()));
    }

    if let Some(feed) = &params.feed {
        query.push(("feed", feed.clone()));
    }

    if let Some(token) = page_token {
        query.push(("page_token", token.to_string()));
    }

    query
}

/// Sort by timestamp and drop bars repeating an earlier timestamp
pub fn sort_and_dedup(bars: &mut Vec<Bar>) {
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
}
