use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossover_core::{
    config::Settings,
    exchange::{utils::validate_symbol, AlpacaClient, BarParams},
    report::{format_summary, format_trades, serve_chart, write_chart, ChartData},
    service::{run_backtest, MarketDataService},
};

#[derive(Parser)]
#[command(name = "crossover")]
#[command(about = "MACD + Stochastic crossover backtester for US ETF minute bars")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load bars, run the strategy and report (the default)
    Backtest(BacktestArgs),
    /// Fetch bars and overwrite the local cache
    Fetch(FetchArgs),
}

#[derive(Args, Default)]
struct BacktestArgs {
    #[arg(short, long)]
    symbol: Option<String>,
    #[arg(short, long)]
    days: Option<i64>,
    /// Ignore the cache file and fetch again
    #[arg(long)]
    refresh: bool,
    #[arg(long)]
    initial_capital: Option<Decimal>,
    #[arg(long)]
    commission_rate: Option<Decimal>,
    /// Where to write the HTML chart
    #[arg(long)]
    chart: Option<String>,
    /// Serve the chart on localhost until Ctrl+C
    #[arg(long)]
    serve: bool,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(short, long)]
    symbol: Option<String>,
    #[arg(short, long)]
    days: Option<i64>,
}

impl BacktestArgs {
    fn apply(&self, settings: &mut Settings) {
        apply_market(settings, self.symbol.as_deref(), self.days);
        if let Some(capital) = self.initial_capital {
            settings.backtest.initial_capital = capital;
        }
        if let Some(rate) = self.commission_rate {
            settings.backtest.commission_rate = rate;
        }
        if let Some(chart) = &self.chart {
            settings.report.chart_path = Some(chart.clone());
        }
    }
}

fn apply_market(settings: &mut Settings, symbol: Option<&str>, days: Option<i64>) {
    if let Some(symbol) = symbol {
        settings.market.symbol = symbol.to_string();
    }
    if let Some(days) = days {
        settings.market.days = days;
    }
}

fn market_data_service(settings: &Settings) -> Result<(MarketDataService, BarParams)> {
    let symbol = validate_symbol(&settings.market.symbol)?;
    let provider = Arc::new(AlpacaClient::from_settings(&settings.alpaca));
    let service = MarketDataService::from_settings(provider, settings, &symbol);
    let params = BarParams::lookback(symbol, settings.market.days, Utc::now())?
        .with_feed(settings.market.feed.clone());

    Ok((service, params))
}

async fn run_backtest_command(args: BacktestArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings);
    settings.validate()?;

    let (service, params) = market_data_service(&settings)?;
    let loaded = service
        .load_bars(&params, args.refresh)
        .await
        .with_context(|| format!("Failed to load bars for {}", params.symbol))?;
    info!("Found {} historical bars ({:?})", loaded.len(), loaded.origin);

    let run = run_backtest(&loaded, &settings)?;

    println!("{}", format_summary(&run.result));
    println!("Trade History:");
    print!("{}", format_trades(&run.result.trades));

    let chart_path = settings.report.chart_path_for(&params.symbol);
    let html = write_chart(&ChartData::from_run(&run), &chart_path)
        .with_context(|| format!("Failed to write chart to {}", chart_path))?;

    if args.serve {
        serve_chart(html, settings.report.serve_port, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    }

    Ok(())
}

async fn run_fetch_command(args: FetchArgs, mut settings: Settings) -> Result<()> {
    apply_market(&mut settings, args.symbol.as_deref(), args.days);
    settings.validate()?;

    let (service, params) = market_data_service(&settings)?;
    let loaded = service
        .refresh(&params)
        .await
        .with_context(|| format!("Failed to fetch bars for {}", params.symbol))?;

    if let Some((first, last)) = loaded.time_range() {
        info!(
            "Cached {} bars for {} ({} to {}) in {}",
            loaded.len(),
            loaded.symbol,
            first,
            last,
            service.cache().path().display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new().context("Failed to load configuration")?;

    match cli.command {
        Some(Commands::Fetch(args)) => run_fetch_command(args, settings).await,
        Some(Commands::Backtest(args)) => run_backtest_command(args, settings).await,
        None => run_backtest_command(BacktestArgs::default(), settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["crossover"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_backtest_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "crossover",
            "backtest",
            "--symbol",
            "qqq",
            "--days",
            "30",
            "--initial-capital",
            "2500",
            "--commission-rate",
            "0.001",
            "--chart",
            "out/chart.html",
            "--refresh",
        ])
        .unwrap();

        let Some(Commands::Backtest(args)) = cli.command else {
            panic!("expected backtest subcommand");
        };
        assert!(args.refresh);
        assert!(!args.serve);

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.market.symbol, "qqq");
        assert_eq!(settings.market.days, 30);
        assert_eq!(settings.backtest.initial_capital, dec!(2500));
        assert_eq!(settings.backtest.commission_rate, dec!(0.001));
        assert_eq!(settings.report.chart_path_for("QQQ"), "out/chart.html");
    }

    #[test]
    fn test_fetch_keeps_unset_fields() {
        let cli = Cli::try_parse_from(["crossover", "fetch", "--days", "5"]).unwrap();
        let Some(Commands::Fetch(args)) = cli.command else {
            panic!("expected fetch subcommand");
        };

        let mut settings = Settings::default();
        apply_market(&mut settings, args.symbol.as_deref(), args.days);
        assert_eq!(settings.market.symbol, "SPY");
        assert_eq!(settings.market.days, 5);
    }
}
