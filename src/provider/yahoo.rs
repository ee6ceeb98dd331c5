use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::error::FetchError;
use crate::model::{Bar, Interval, LookbackRange, Series};
use crate::provider::MarketData;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Unauthenticated chart requests get throttled aggressively; stay low.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

const USER_AGENT: &str = concat!("stock-charter/", env!("CARGO_PKG_VERSION"));

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(base_url: impl Into<String>, requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps);
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_REQUESTS_PER_SECOND)
    }
}

impl MarketData for YahooProvider {
    fn fetch_bars(
        &self,
        symbol: &str,
        range: LookbackRange,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Series, Report<FetchError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            // Wait for rate limiter before making the request
            self.rate_limiter.until_ready().await;

            let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
            let params = [("range", range.as_str()), ("interval", interval.as_str())];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(FetchError::Upstream {
                    symbol: symbol.clone(),
                })?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                // Unknown or delisted symbols come back as 404
                return Err(Report::new(FetchError::NoData { symbol }));
            }
            if !status.is_success() {
                return Err(Report::new(FetchError::Upstream { symbol })
                    .attach(format!("HTTP status: {status}")));
            }

            let raw: ChartResponse =
                response
                    .json()
                    .await
                    .change_context(FetchError::ResponseParse {
                        symbol: symbol.clone(),
                    })?;

            let series = raw.into_series(&symbol, range, interval)?;

            info!(
                symbol = %series.symbol(),
                range = %range,
                interval = %interval,
                fetched = series.len(),
                "market data fetch complete"
            );

            Ok(series)
        })
    }
}

// ── Chart endpoint response types ─────────────────────────────────────────────

/// Envelope: `{ "chart": { "result": [...], "error": null } }`
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteBlock>,
}

/// Per-field arrays aligned with `timestamp`; entries may be null for
/// intervals the provider has no trade data for.
#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_series(
        self,
        symbol: &str,
        range: LookbackRange,
        interval: Interval,
    ) -> Result<Series, Report<FetchError>> {
        if let Some(error) = self.chart.error {
            return Err(Report::new(FetchError::Upstream {
                symbol: symbol.to_owned(),
            })
            .attach(format!("{}: {}", error.code, error.description)));
        }

        let result = self
            .chart
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.remove(0)))
            .ok_or_else(|| {
                Report::new(FetchError::NoData {
                    symbol: symbol.to_owned(),
                })
            })?;

        let quote = result.indicators.quote.into_iter().next().ok_or_else(|| {
            Report::new(FetchError::ResponseParse {
                symbol: symbol.to_owned(),
            })
            .attach("missing quote block")
        })?;

        let n = result.timestamp.len();
        if quote.open.len() != n
            || quote.high.len() != n
            || quote.low.len() != n
            || quote.close.len() != n
            || quote.volume.len() != n
        {
            return Err(Report::new(FetchError::ResponseParse {
                symbol: symbol.to_owned(),
            })
            .attach("quote arrays not aligned with timestamps"));
        }

        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            // Intervals without trade data carry nulls; skip the whole row
            let (Some(open), Some(high), Some(low), Some(close)) =
                (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
            else {
                continue;
            };
            let Some(timestamp) = DateTime::from_timestamp(result.timestamp[i], 0) else {
                continue;
            };
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: quote.volume[i].unwrap_or(0.0),
            });
        }

        if bars.is_empty() {
            return Err(Report::new(FetchError::NoData {
                symbol: symbol.to_owned(),
            }));
        }

        Series::new(symbol, range, interval, bars).change_context(FetchError::ResponseParse {
            symbol: symbol.to_owned(),
        })
    }
}
