use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;

use crate::error::RenderError;
use crate::model::{Bar, EnrichedSeries};

const UP_COLOR: &str = "#00c853";
const DOWN_COLOR: &str = "#ff5252";
const UP_VOLUME_COLOR: &str = "rgba(0, 200, 83, 0.4)";
const DOWN_VOLUME_COLOR: &str = "rgba(255, 82, 82, 0.4)";
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Renders enriched series into self-contained interactive HTML documents.
///
/// One artifact per symbol at a deterministic path under `output_dir`;
/// rendering the same symbol again overwrites the previous artifact.
pub struct ChartRenderer {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct CandlePoint {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Serialize)]
struct VolumePoint {
    time: i64,
    value: f64,
    color: &'static str,
}

#[derive(Serialize)]
struct LinePoint {
    time: i64,
    value: f64,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic artifact file name for a symbol.
    ///
    /// The symbol is uppercased and reduced to `[A-Za-z0-9._-]` so the name
    /// is always a bare file name, never a path.
    pub fn artifact_name(symbol: &str) -> Result<String, Report<RenderError>> {
        let safe: String = symbol
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .flat_map(char::to_uppercase)
            .collect();
        if safe.is_empty() {
            return Err(Report::new(RenderError::InvalidSymbol {
                symbol: symbol.to_owned(),
            }));
        }
        Ok(format!("{safe}_chart.html"))
    }

    /// Render `enriched` to its per-symbol artifact path and return the path.
    ///
    /// Output is byte-identical for identical input; no timestamps or
    /// randomness go into the document.
    pub fn render(&self, enriched: &EnrichedSeries) -> Result<PathBuf, Report<RenderError>> {
        let symbol = enriched.series.symbol();
        let path = self.output_dir.join(Self::artifact_name(symbol)?);

        let html = build_document(enriched)?;

        std::fs::write(&path, html)
            .change_context(RenderError::Write)
            .attach_with(|| format!("path: {}", path.display()))?;

        info!(
            symbol = %symbol,
            bars = enriched.series.len(),
            path = %path.display(),
            "chart artifact written"
        );

        Ok(path)
    }
}

fn build_document(enriched: &EnrichedSeries) -> Result<String, Report<RenderError>> {
    let bars = enriched.series.bars();

    let candles: Vec<CandlePoint> = bars
        .iter()
        .map(|b| CandlePoint {
            time: b.timestamp.timestamp(),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
        })
        .collect();

    let volume: Vec<VolumePoint> = bars
        .iter()
        .map(|b| VolumePoint {
            time: b.timestamp.timestamp(),
            value: b.volume,
            color: if b.close >= b.open {
                UP_VOLUME_COLOR
            } else {
                DOWN_VOLUME_COLOR
            },
        })
        .collect();

    let sma = line_points(bars, &enriched.sma);
    let ema = line_points(bars, &enriched.ema);
    let rsi = line_points(bars, &enriched.rsi);

    // Reference lines span the full time axis, defined bars or not
    let overbought: Vec<LinePoint> = bars
        .iter()
        .map(|b| LinePoint {
            time: b.timestamp.timestamp(),
            value: RSI_OVERBOUGHT,
        })
        .collect();
    let oversold: Vec<LinePoint> = bars
        .iter()
        .map(|b| LinePoint {
            time: b.timestamp.timestamp(),
            value: RSI_OVERSOLD,
        })
        .collect();

    let html = page_template(
        enriched.series.symbol(),
        &encode(&candles)?,
        &encode(&volume)?,
        &encode(&sma)?,
        &encode(&ema)?,
        &encode(&rsi)?,
        &encode(&overbought)?,
        &encode(&oversold)?,
    );

    Ok(html)
}

fn encode<T: Serialize>(value: &T) -> Result<String, Report<RenderError>> {
    serde_json::to_string(value).change_context(RenderError::Encode)
}

fn line_points(bars: &[Bar], column: &[Option<f64>]) -> Vec<LinePoint> {
    bars.iter()
        .zip(column)
        .filter_map(|(bar, value)| {
            value.map(|v| LinePoint {
                time: bar.timestamp.timestamp(),
                value: v,
            })
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn page_template(
    symbol: &str,
    candles: &str,
    volume: &str,
    sma: &str,
    ema: &str,
    rsi: &str,
    overbought: &str,
    oversold: &str,
) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{symbol} Stock Analysis</title>
    <script src="https://unpkg.com/lightweight-charts@4.1.0/dist/lightweight-charts.standalone.production.js"></script>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #131722;
            color: #d1d4dc;
        }}
        .header {{
            padding: 10px 20px;
            background: #1e222d;
            border-bottom: 1px solid #2a2e39;
            display: flex;
            align-items: center;
            gap: 16px;
        }}
        .header h1 {{ font-size: 16px; font-weight: 600; }}
        .legend {{ display: flex; gap: 14px; font-size: 12px; color: #787b86; }}
        .legend .sma {{ color: #ff9800; }}
        .legend .ema {{ color: #2196f3; }}
        .legend .rsi {{ color: #e91e63; }}
        #price-pane {{ width: 100%; height: 54vh; }}
        #volume-pane {{ width: 100%; height: 18vh; border-top: 1px solid #2a2e39; }}
        #rsi-pane {{ width: 100%; height: 18vh; border-top: 1px solid #2a2e39; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{symbol} Stock Analysis</h1>
        <div class="legend">
            <span class="sma">SMA(10)</span>
            <span class="ema">EMA(20)</span>
            <span class="rsi">RSI(14) &middot; 70 overbought / 30 oversold</span>
        </div>
    </div>
    <div id="price-pane"></div>
    <div id="volume-pane"></div>
    <div id="rsi-pane"></div>

    <script>
        const candleData = {candles};
        const volumeData = {volume};
        const smaData = {sma};
        const emaData = {ema};
        const rsiData = {rsi};
        const overboughtData = {overbought};
        const oversoldData = {oversold};

        const paneOptions = {{
            layout: {{
                background: {{ type: 'solid', color: '#131722' }},
                textColor: '#d1d4dc',
            }},
            grid: {{
                vertLines: {{ color: '#1e222d' }},
                horzLines: {{ color: '#1e222d' }},
            }},
            rightPriceScale: {{ borderColor: '#2a2e39' }},
            timeScale: {{ borderColor: '#2a2e39', timeVisible: true, secondsVisible: false }},
        }};

        const priceChart = LightweightCharts.createChart(
            document.getElementById('price-pane'), paneOptions);
        const volumeChart = LightweightCharts.createChart(
            document.getElementById('volume-pane'), paneOptions);
        const rsiChart = LightweightCharts.createChart(
            document.getElementById('rsi-pane'), paneOptions);

        const candleSeries = priceChart.addCandlestickSeries({{
            upColor: '{up}',
            downColor: '{down}',
            borderUpColor: '{up}',
            borderDownColor: '{down}',
            wickUpColor: '{up}',
            wickDownColor: '{down}',
        }});
        candleSeries.setData(candleData);

        const smaSeries = priceChart.addLineSeries({{
            color: '#ff9800', lineWidth: 2,
            priceLineVisible: false, lastValueVisible: false,
        }});
        smaSeries.setData(smaData);

        const emaSeries = priceChart.addLineSeries({{
            color: '#2196f3', lineWidth: 2,
            priceLineVisible: false, lastValueVisible: false,
        }});
        emaSeries.setData(emaData);

        const volumeSeries = volumeChart.addHistogramSeries({{
            priceFormat: {{ type: 'volume' }},
        }});
        volumeSeries.setData(volumeData);

        const overboughtSeries = rsiChart.addLineSeries({{
            color: 'rgba(255, 82, 82, 0.6)', lineWidth: 1, lineStyle: 2,
            priceLineVisible: false, lastValueVisible: false,
        }});
        overboughtSeries.setData(overboughtData);

        const oversoldSeries = rsiChart.addLineSeries({{
            color: 'rgba(0, 200, 83, 0.6)', lineWidth: 1, lineStyle: 2,
            priceLineVisible: false, lastValueVisible: false,
        }});
        oversoldSeries.setData(oversoldData);

        const rsiSeries = rsiChart.addLineSeries({{
            color: '#e91e63', lineWidth: 2, priceLineVisible: false,
        }});
        rsiSeries.setData(rsiData);

        // Keep the three panes on the same visible time range
        const charts = [priceChart, volumeChart, rsiChart];
        for (const source of charts) {{
            source.timeScale().subscribeVisibleLogicalRangeChange(range => {{
                if (!range) return;
                for (const target of charts) {{
                    if (target !== source) {{
                        target.timeScale().setVisibleLogicalRange(range);
                    }}
                }}
            }});
        }}
        priceChart.timeScale().fitContent();

        window.addEventListener('resize', () => {{
            for (const [chart, id] of [
                [priceChart, 'price-pane'],
                [volumeChart, 'volume-pane'],
                [rsiChart, 'rsi-pane'],
            ]) {{
                const el = document.getElementById(id);
                chart.applyOptions({{ width: el.clientWidth, height: el.clientHeight }});
            }}
        }});
    </script>
</body>
</html>"##,
        symbol = symbol,
        candles = candles,
        volume = volume,
        sma = sma,
        ema = ema,
        rsi = rsi,
        overbought = overbought,
        oversold = oversold,
        up = UP_COLOR,
        down = DOWN_COLOR,
    )
}
