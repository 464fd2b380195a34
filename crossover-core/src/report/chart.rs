//! Self-contained backtest chart.
//!
//! Renders one HTML page with TradingView Lightweight Charts loaded from a
//! CDN: close price with entry/exit markers, the equity curve, and the two
//! indicator pairs. All data is embedded as JSON, so the file opens without a
//! server.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::info;

use super::ReportError;
use crate::backtest::OrderSide;
use crate::service::BacktestRun;

const LIGHTWEIGHT_CHARTS_URL: &str =
    "https://unpkg.com/lightweight-charts@4.1.0/dist/lightweight-charts.standalone.production.js";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMarker {
    pub time: i64,
    pub position: &'static str,
    pub color: &'static str,
    pub shape: &'static str,
    pub text: String,
}

/// Everything the page plots, in Lightweight Charts' `{ time, value }` shape
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub title: String,
    pub price: Vec<ChartPoint>,
    pub equity: Vec<ChartPoint>,
    pub macd: Vec<ChartPoint>,
    pub signal: Vec<ChartPoint>,
    pub stoch_k: Vec<ChartPoint>,
    pub stoch_d: Vec<ChartPoint>,
    pub markers: Vec<ChartMarker>,
}

/// Pair timestamps with defined values; undefined bars are left as gaps
fn defined_points(timestamps: &[DateTime<Utc>], values: &[Option<f64>]) -> Vec<ChartPoint> {
    timestamps
        .iter()
        .zip(values)
        .filter_map(|(t, v)| {
            v.map(|value| ChartPoint {
                time: t.timestamp(),
                value,
            })
        })
        .collect()
}

impl ChartData {
    pub fn from_run(run: &BacktestRun) -> Self {
        let timestamps = run.series.timestamps();
        let result = &run.result;

        let price = run
            .series
            .iter()
            .map(|(t, p)| ChartPoint {
                time: t.timestamp(),
                value: p,
            })
            .collect();

        let equity = result
            .equity_curve
            .iter()
            .map(|point| ChartPoint {
                time: point.timestamp.timestamp(),
                value: point.value.to_f64().unwrap_or_default(),
            })
            .collect();

        let markers = result
            .fills
            .iter()
            .map(|fill| match fill.side {
                OrderSide::Buy => ChartMarker {
                    time: fill.timestamp.timestamp(),
                    position: "belowBar",
                    color: "#00c853",
                    shape: "arrowUp",
                    text: format!("Buy @ {:.2}", fill.price),
                },
                OrderSide::Sell => ChartMarker {
                    time: fill.timestamp.timestamp(),
                    position: "aboveBar",
                    color: "#ff5252",
                    shape: "arrowDown",
                    text: format!("Sell @ {:.2}", fill.price),
                },
            })
            .collect();

        Self {
            title: format!("{} - {}", run.series.symbol(), result.strategy_name),
            price,
            equity,
            macd: defined_points(timestamps, &run.indicators.macd),
            signal: defined_points(timestamps, &run.indicators.signal),
            stoch_k: defined_points(timestamps, &run.indicators.stoch_k),
            stoch_d: defined_points(timestamps, &run.indicators.stoch_d),
            markers,
        }
    }
}

/// JSON safe to embed inside a `<script>` element
fn embeddable_json(data: &ChartData) -> Result<String, ReportError> {
    Ok(serde_json::to_string(data)?.replace("</", "<\\/"))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_chart(data: &ChartData) -> Result<String, ReportError> {
    let json = embeddable_json(data)?;
    let title = html_escape(&data.title);

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{script}"></script>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #131722;
            color: #d1d4dc;
        }}
        .header {{
            padding: 12px 24px;
            background: #1e222d;
            border-bottom: 1px solid #2a2e39;
        }}
        .header h1 {{ font-size: 18px; color: #00c853; font-weight: 600; }}
        .pane-title {{ padding: 6px 24px; font-size: 12px; color: #787b86; }}
        #price {{ height: 45vh; }}
        #equity, #macd, #stoch {{ height: 16vh; }}
    </style>
</head>
<body>
    <div class="header"><h1>{title}</h1></div>
    <div id="price"></div>
    <div class="pane-title">Equity</div>
    <div id="equity"></div>
    <div class="pane-title">MACD / Signal</div>
    <div id="macd"></div>
    <div class="pane-title">%K / %D</div>
    <div id="stoch"></div>
    <script>
        const DATA = {json};

        function makeChart(id, showTime) {{
            return LightweightCharts.createChart(document.getElementById(id), {{
                autoSize: true,
                layout: {{
                    background: {{ type: 'solid', color: '#131722' }},
                    textColor: '#d1d4dc',
                }},
                grid: {{
                    vertLines: {{ color: '#1e222d' }},
                    horzLines: {{ color: '#1e222d' }},
                }},
                crosshair: {{ mode: LightweightCharts.CrosshairMode.Normal }},
                rightPriceScale: {{ borderColor: '#2a2e39' }},
                timeScale: {{
                    borderColor: '#2a2e39',
                    timeVisible: showTime,
                    secondsVisible: false,
                }},
            }});
        }}

        function line(chart, color, data) {{
            const series = chart.addLineSeries({{
                color: color,
                lineWidth: 2,
                priceLineVisible: false,
            }});
            series.setData(data);
            return series;
        }}

        const priceChart = makeChart('price', true);
        const priceSeries = line(priceChart, '#2196f3', DATA.price);
        priceSeries.setMarkers(DATA.markers);

        const equityChart = makeChart('equity', false);
        line(equityChart, '#00c853', DATA.equity);

        const macdChart = makeChart('macd', false);
        line(macdChart, '#2196f3', DATA.macd);
        line(macdChart, '#ff9800', DATA.signal);

        const stochChart = makeChart('stoch', false);
        line(stochChart, '#e91e63', DATA.stoch_k);
        line(stochChart, '#9c27b0', DATA.stoch_d);

        // Keep every pane on the price chart's visible range
        const followers = [equityChart, macdChart, stochChart];
        priceChart.timeScale().subscribeVisibleLogicalRangeChange(range => {{
            if (range) {{
                followers.forEach(c => c.timeScale().setVisibleLogicalRange(range));
            }}
        }});
        priceChart.timeScale().fitContent();
    </script>
</body>
</html>"##,
        title = title,
        script = LIGHTWEIGHT_CHARTS_URL,
        json = json,
    ))
}

/// Render and write the page, returning the HTML for optional serving
pub fn write_chart(data: &ChartData, path: impl AsRef<Path>) -> Result<String, ReportError> {
    let path = path.as_ref();
    let html = render_chart(data)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &html)?;

    info!("Chart written to {}", path.display());
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::service::{run_backtest, DataOrigin, LoadedBars};
    use chrono::{Duration, TimeZone};
    use crossover_common::data::Bar;

    fn run() -> BacktestRun {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let bars = (0..200)
            .map(|i| {
                let p = 100.0 + (i as f64 * 0.21).sin() * 2.0 + (i as f64 * 0.05).cos();
                Bar::new(start + Duration::minutes(i), "SPY", p, p, p, p, 100.0)
            })
            .collect();
        let loaded = LoadedBars {
            symbol: "SPY".to_string(),
            bars,
            origin: DataOrigin::Cache,
        };
        run_backtest(&loaded, &Settings::default()).unwrap()
    }

    #[test]
    fn test_chart_data_skips_undefined_values() {
        let run = run();
        let data = ChartData::from_run(&run);

        assert_eq!(data.price.len(), 200);
        assert_eq!(data.equity.len(), 200);
        // MACD needs 26 bars, the signal another 8
        assert_eq!(data.macd.len(), 200 - 25);
        assert_eq!(data.signal.len(), 200 - 33);
        assert_eq!(data.markers.len(), run.result.fills.len());
        assert!(data.markers.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_markers_follow_fill_side() {
        let data = ChartData::from_run(&run());
        let first = data.markers.first().unwrap();
        assert_eq!(first.shape, "arrowUp");
        assert_eq!(first.position, "belowBar");
        assert!(first.text.starts_with("Buy @ "));
        if let Some(second) = data.markers.get(1) {
            assert_eq!(second.shape, "arrowDown");
        }
    }

    #[test]
    fn test_render_embeds_data_and_escapes_title() {
        let mut data = ChartData::from_run(&run());
        data.title = "SPY </script><b>".to_string();

        let html = render_chart(&data).unwrap();
        assert!(html.contains("lightweight-charts"));
        assert!(html.contains("const DATA = {"));
        assert!(html.contains("SPY &lt;/script&gt;&lt;b&gt;"));
        assert!(html.contains(r#"SPY <\/script><b>"#));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_write_chart_creates_file() {
        let dir = std::env::temp_dir().join(format!("crossover-chart-{}", std::process::id()));
        let path = dir.join("SPY_backtest.html");

        let html = write_chart(&ChartData::from_run(&run()), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), html);

        let _ = fs::remove_dir_all(&dir);
    }
}
