use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::chart::ChartRenderer;
use crate::model::{Interval, LookbackRange};
use crate::pipeline::{self, AnalyzeRequest};
use crate::provider::MarketData;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketData>,
    pub renderer: Arc<ChartRenderer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/analyze", post(analyze))
        .route("/charts/{file}", get(serve_chart))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub ticker: String,
    pub period: Option<String>,
    pub interval: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> (StatusCode, Json<Value>) {
    let range = match parse_optional(form.period.as_deref(), LookbackRange::from_str) {
        Ok(range) => range,
        Err(raw) => return bad_request(format!("Unsupported period \"{raw}\".")),
    };
    let interval = match parse_optional(form.interval.as_deref(), Interval::from_str) {
        Ok(interval) => interval,
        Err(raw) => return bad_request(format!("Unsupported interval \"{raw}\".")),
    };

    let request = AnalyzeRequest {
        ticker: form.ticker,
        range,
        interval,
    };

    match pipeline::run(state.provider.as_ref(), state.renderer.as_ref(), &request).await {
        Ok(path) => {
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "chart_url": format!("/charts/{file}"),
                })),
            )
        }
        Err(report) => {
            let context = report.current_context();
            let status = if context.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!(error = ?report, ticker = %request.ticker, "analysis request failed");
            (status, Json(json!({ "error": context.to_string() })))
        }
    }
}

/// Missing or empty optional fields fall back to the default; a present but
/// unrecognized value is a client error carrying the raw string.
fn parse_optional<T: Default>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(value) => parse(value).ok_or_else(|| value.to_owned()),
    }
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

/// Serve a rendered artifact from the charts directory.
///
/// Only bare file names are accepted; anything that looks like a path is a
/// 404, same as a file that does not exist.
async fn serve_chart(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Html<String>, StatusCode> {
    if file.contains('/') || file.contains('\\') || file.contains("..") {
        return Err(StatusCode::NOT_FOUND);
    }

    let path = state.renderer.output_dir().join(&file);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Stock Charter</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #131722;
            color: #d1d4dc;
            min-height: 100vh;
        }
        .header {
            padding: 12px 24px;
            background: #1e222d;
            border-bottom: 1px solid #2a2e39;
            display: flex;
            align-items: center;
            gap: 16px;
            flex-wrap: wrap;
        }
        .header h1 { font-size: 18px; color: #00c853; font-weight: 600; }
        form { display: flex; gap: 12px; align-items: center; flex-wrap: wrap; }
        select, button, input {
            background: #2a2e39;
            border: 1px solid #363c4e;
            color: #d1d4dc;
            padding: 8px 12px;
            border-radius: 4px;
            font-size: 14px;
        }
        input { width: 120px; text-transform: uppercase; }
        button { background: #00c853; color: #131722; font-weight: 600; cursor: pointer; }
        button:hover { background: #00e676; }
        #error { padding: 12px 24px; color: #ff5252; display: none; }
        #chart-frame { width: 100%; height: calc(100vh - 60px); border: none; display: none; }
        #hint { padding: 40px; text-align: center; color: #787b86; }
    </style>
</head>
<body>
    <div class="header">
        <h1>Stock Charter</h1>
        <form id="analyze-form">
            <input id="ticker" name="ticker" placeholder="Ticker (e.g. AAPL)" autofocus>
            <select id="period" name="period">
                <option value="1d">1 day</option>
                <option value="5d">5 days</option>
                <option value="1mo" selected>1 month</option>
                <option value="3mo">3 months</option>
                <option value="6mo">6 months</option>
                <option value="1y">1 year</option>
                <option value="2y">2 years</option>
                <option value="5y">5 years</option>
                <option value="ytd">Year to date</option>
                <option value="max">Max</option>
            </select>
            <select id="interval" name="interval">
                <option value="1m">1 minute</option>
                <option value="5m">5 minutes</option>
                <option value="15m">15 minutes</option>
                <option value="30m">30 minutes</option>
                <option value="1h">1 hour</option>
                <option value="1d" selected>1 day</option>
                <option value="1wk">1 week</option>
                <option value="1mo">1 month</option>
            </select>
            <button type="submit">Analyze</button>
        </form>
    </div>
    <div id="error"></div>
    <div id="hint">Enter a ticker symbol to fetch its price history and indicators.</div>
    <iframe id="chart-frame" title="chart"></iframe>

    <script>
        const form = document.getElementById('analyze-form');
        const errorBox = document.getElementById('error');
        const frame = document.getElementById('chart-frame');
        const hint = document.getElementById('hint');

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            errorBox.style.display = 'none';

            const body = new URLSearchParams(new FormData(form));
            try {
                const response = await fetch('/analyze', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
                    body,
                });
                const payload = await response.json();
                if (!response.ok) {
                    throw new Error(payload.error || 'Request failed');
                }
                hint.style.display = 'none';
                frame.style.display = 'block';
                frame.src = payload.chart_url;
            } catch (err) {
                errorBox.textContent = err.message;
                errorBox.style.display = 'block';
            }
        });
    </script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::{Bar, Series};
    use chrono::{TimeZone, Utc};
    use error_stack::Report;
    use futures::future::BoxFuture;
    use std::path::PathBuf;

    struct FixedProvider {
        closes: Option<Vec<f64>>,
    }

    impl MarketData for FixedProvider {
        fn fetch_bars(
            &self,
            symbol: &str,
            range: LookbackRange,
            interval: Interval,
        ) -> BoxFuture<'_, Result<Series, Report<FetchError>>> {
            let symbol = symbol.to_owned();
            Box::pin(async move {
                match &self.closes {
                    Some(closes) => {
                        let bars: Vec<Bar> = closes
                            .iter()
                            .enumerate()
                            .map(|(i, &c)| Bar {
                                timestamp: Utc
                                    .timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0)
                                    .unwrap(),
                                open: c,
                                high: c + 1.0,
                                low: c - 1.0,
                                close: c,
                                volume: 100.0,
                            })
                            .collect();
                        Ok(Series::new(symbol, range, interval, bars).unwrap())
                    }
                    None => Err(Report::new(FetchError::NoData { symbol })),
                }
            })
        }
    }

    fn state(closes: Option<Vec<f64>>, name: &str) -> (AppState, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "stock-charter-server-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let state = AppState {
            provider: Arc::new(FixedProvider { closes }),
            renderer: Arc::new(ChartRenderer::new(&dir)),
        };
        (state, dir)
    }

    fn form(ticker: &str, period: Option<&str>, interval: Option<&str>) -> AnalyzeForm {
        AnalyzeForm {
            ticker: ticker.to_owned(),
            period: period.map(str::to_owned),
            interval: interval.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn missing_ticker_is_client_error() {
        let (state, _) = state(Some(vec![1.0; 30]), "missing-ticker");
        let (status, Json(body)) = analyze(State(state), Form(form("", None, None))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Ticker symbol is required.");
    }

    #[tokio::test]
    async fn no_data_is_server_error() {
        let (state, dir) = state(None, "no-data");
        let (status, Json(body)) = analyze(State(state), Form(form("ZZZZ", None, None))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No data available for the given ticker.");
        assert!(!dir.join("ZZZZ_chart.html").exists());
    }

    #[tokio::test]
    async fn unsupported_period_is_client_error() {
        let (state, _) = state(Some(vec![1.0; 30]), "bad-period");
        let (status, Json(body)) =
            analyze(State(state), Form(form("AAPL", Some("2mo"), None))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported period \"2mo\".");
    }

    #[tokio::test]
    async fn analyze_returns_deterministic_chart_url() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.5).collect();
        let (state, dir) = state(Some(closes), "success");

        let (status, Json(body)) =
            analyze(State(state), Form(form("aapl", Some("1mo"), Some("1d")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["chart_url"], "/charts/AAPL_chart.html");

        let html = std::fs::read_to_string(dir.join("AAPL_chart.html")).unwrap();
        assert!(html.contains("price-pane"));
        assert!(html.contains("volume-pane"));
        assert!(html.contains("rsi-pane"));
        assert!(html.contains("\"value\":70.0"));
        assert!(html.contains("\"value\":30.0"));
    }

    #[tokio::test]
    async fn empty_optional_fields_fall_back_to_defaults() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let (state, _) = state(Some(closes), "defaults");
        let (status, Json(body)) =
            analyze(State(state), Form(form("msft", Some(""), Some("")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chart_url"], "/charts/MSFT_chart.html");
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn serve_chart_rejects_path_like_names() {
        let (state, _) = state(Some(vec![1.0; 5]), "traversal");
        for name in ["../secret", "a/b.html", "a\\b.html"] {
            let result = serve_chart(State(state.clone()), Path(name.to_owned())).await;
            assert_eq!(result.unwrap_err(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn serve_chart_returns_rendered_artifact() {
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let (state, _) = state(Some(closes), "serve");
        let (status, _) = analyze(
            State(state.clone()),
            Form(form("NVDA", None, None)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let html = serve_chart(State(state), Path("NVDA_chart.html".to_owned()))
            .await
            .unwrap();
        assert!(html.0.contains("NVDA Stock Analysis"));
    }

    #[tokio::test]
    async fn serve_chart_missing_file_is_not_found() {
        let (state, _) = state(Some(vec![1.0; 5]), "missing-file");
        let result = serve_chart(State(state), Path("NOPE_chart.html".to_owned())).await;
        assert_eq!(result.unwrap_err(), StatusCode::NOT_FOUND);
    }
}
