use rust_decimal::Decimal;

use crate::backtest::{BacktestResult, Metrics, Trade};

const LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 26;

fn pct(value: Decimal) -> String {
    format!("{:.2}%", value)
}

fn opt_pct(value: Option<Decimal>) -> String {
    value.map(pct).unwrap_or_else(|| "n/a".to_string())
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// `1d 02:03:04` style rendering of a span in seconds
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    let (days, rem) = (s / 86_400, s % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, secs) = (rem / 60, rem % 60);

    if days > 0 {
        format!("{}{}d {:02}:{:02}:{:02}", sign, days, hours, minutes, secs)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, secs)
    }
}

fn metric_rows(metrics: &Metrics) -> Vec<(&'static str, String)> {
    vec![
        ("Start", metrics.start.format("%Y-%m-%d %H:%M").to_string()),
        ("End", metrics.end.format("%Y-%m-%d %H:%M").to_string()),
        ("Bars", metrics.bars.to_string()),
        ("Start Value", money(metrics.start_value)),
        ("End Value", money(metrics.end_value)),
        ("Total Return", pct(metrics.total_return)),
        ("Benchmark Return", pct(metrics.benchmark_return)),
        ("Total Fees Paid", money(metrics.total_fees)),
        ("Max Drawdown", pct(metrics.max_drawdown)),
        ("Max Drawdown Duration", format_duration(metrics.max_drawdown_duration)),
        ("Exposure", pct(metrics.exposure)),
        ("Total Trades", metrics.total_trades.to_string()),
        ("Total Closed Trades", metrics.closed_trades.to_string()),
        ("Total Open Trades", metrics.open_trades.to_string()),
        ("Open Trade PnL", money(metrics.open_trade_pnl)),
        ("Win Rate", pct(metrics.win_rate)),
        ("Best Trade", opt_pct(metrics.best_trade)),
        ("Worst Trade", opt_pct(metrics.worst_trade)),
        ("Avg Winning Trade", opt_pct(metrics.avg_winning_trade)),
        ("Avg Losing Trade", opt_pct(metrics.avg_losing_trade)),
        ("Avg Trade Duration", format_duration(metrics.avg_trade_duration)),
        (
            "Profit Factor",
            metrics
                .profit_factor
                .map(|pf| format!("{:.3}", pf))
                .unwrap_or_else(|| "n/a".to_string()),
        ),
        ("Expectancy", money(metrics.expectancy)),
        ("Sharpe Ratio", format!("{:.3}", metrics.sharpe_ratio)),
        ("Sortino Ratio", format!("{:.3}", metrics.sortino_ratio)),
    ]
}

/// Fixed-width metrics table headed by the strategy and its parameters
pub fn format_summary(result: &BacktestResult) -> String {
    let rule = "-".repeat(LABEL_WIDTH + VALUE_WIDTH + 1);
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", result.strategy_name));
    if !result.parameters.is_empty() {
        let params: Vec<String> = result
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        out.push_str(&format!("{}\n", params.join(" ")));
    }
    out.push_str(&rule);
    out.push('\n');

    for (label, value) in metric_rows(&result.metrics) {
        out.push_str(&format!(
            "{:<lw$} {:>vw$}\n",
            label,
            value,
            lw = LABEL_WIDTH,
            vw = VALUE_WIDTH
        ));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

fn trade_row(index: usize, trade: &Trade) -> String {
    let exit_time = trade
        .exit_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "open".to_string());
    let exit_price = trade.exit_price.map(money).unwrap_or_else(|| "-".to_string());

    format!(
        "{:>4}  {:<16}  {:>10}  {:<16}  {:>10}  {:>12}  {:>10}  {:>8}",
        index + 1,
        trade.entry_time.format("%Y-%m-%d %H:%M").to_string(),
        money(trade.entry_price),
        exit_time,
        exit_price,
        format!("{:.4}", trade.quantity),
        money(trade.pnl),
        pct(trade.return_pct),
    )
}

/// One line per round trip, open trades last with `open` as exit time
pub fn format_trades(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "No trades\n".to_string();
    }

    let mut out = format!(
        "{:>4}  {:<16}  {:>10}  {:<16}  {:>10}  {:>12}  {:>10}  {:>8}\n",
        "#", "Entry", "Price", "Exit", "Price", "Qty", "PnL", "Return"
    );
    for (i, trade) in trades.iter().enumerate() {
        out.push_str(&trade_row(i, trade));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn metrics() -> Metrics {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        Metrics {
            start,
            end: start + Duration::minutes(390),
            bars: 391,
            start_value: dec!(10000),
            end_value: dec!(10250),
            total_return: dec!(2.5),
            benchmark_return: dec!(1.25),
            total_fees: Decimal::ZERO,
            max_drawdown: dec!(0.8),
            max_drawdown_duration: 5_400,
            sharpe_ratio: 1.25,
            sortino_ratio: 2.0,
            exposure: dec!(40),
            total_trades: 2,
            closed_trades: 1,
            open_trades: 1,
            open_trade_pnl: dec!(50),
            winning_trades: 1,
            losing_trades: 0,
            win_rate: dec!(100),
            best_trade: Some(dec!(2)),
            worst_trade: Some(dec!(2)),
            avg_winning_trade: Some(dec!(2)),
            avg_losing_trade: None,
            profit_factor: None,
            expectancy: dec!(200),
            avg_trade_duration: 600,
        }
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(5_400), "01:30:00");
        assert_eq!(format_duration(90_061), "1d 01:01:01");
    }

    #[test]
    fn test_summary_lists_metrics() {
        let mut parameters = BTreeMap::new();
        parameters.insert("macd_fast".to_string(), "12".to_string());
        let result = BacktestResult {
            strategy_name: "MACD + Stochastic crossover".to_string(),
            parameters,
            metrics: metrics(),
            trades: vec![],
            fills: vec![],
            equity_curve: vec![],
        };

        let summary = format_summary(&result);
        assert!(summary.contains("MACD + Stochastic crossover"));
        assert!(summary.contains("macd_fast=12"));
        assert!(summary.contains("2.50%"));
        assert!(summary.contains("01:30:00"));
        assert!(summary.contains("1.250"));

        let profit_factor = summary
            .lines()
            .find(|l| l.starts_with("Profit Factor"))
            .unwrap();
        assert!(profit_factor.ends_with("n/a"));
    }

    #[test]
    fn test_trade_list_marks_open_trades() {
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 14, 31, 0).unwrap();
        let trade = Trade {
            entry_time: entry,
            entry_price: dec!(500),
            exit_time: None,
            exit_price: None,
            quantity: dec!(20),
            fees: Decimal::ZERO,
            pnl: dec!(50),
            return_pct: dec!(0.5),
        };

        let text = format_trades(&[trade]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("open"));
        assert!(lines[1].contains("2024-03-01 14:31"));
        assert_eq!(format_trades(&[]), "No trades\n");
    }
}
