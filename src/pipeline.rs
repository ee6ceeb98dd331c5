use std::path::PathBuf;

use derive_more::{Display, Error};
use error_stack::Report;
use tracing::info;

use crate::chart::ChartRenderer;
use crate::enrich::enrich;
use crate::error::FetchError;
use crate::model::{Interval, LookbackRange};
use crate::provider::MarketData;

/// One "analyze a ticker" request, defaults already applied.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub ticker: String,
    pub range: LookbackRange,
    pub interval: Interval,
}

/// Caller-visible pipeline failure.
///
/// `MissingTicker` is a client error; everything else is a server error.
/// Display strings double as the HTTP error payload.
#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("Ticker symbol is required.")]
    MissingTicker,
    #[display("No data available for the given ticker.")]
    NoData,
    #[display("Error fetching data: {message}")]
    Fetch { message: String },
    #[display("Error calculating indicators: {message}")]
    Indicator { message: String },
    #[display("Error generating chart: {message}")]
    Render { message: String },
}

impl PipelineError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingTicker)
    }
}

/// Run the fetch → enrich → render pipeline for one request.
///
/// Strictly sequential; the first failing stage short-circuits and no stage
/// recovers another stage's failure. Returns the artifact path on success.
pub async fn run(
    provider: &dyn MarketData,
    renderer: &ChartRenderer,
    request: &AnalyzeRequest,
) -> Result<PathBuf, Report<PipelineError>> {
    let ticker = request.ticker.trim();
    if ticker.is_empty() {
        return Err(Report::new(PipelineError::MissingTicker));
    }

    info!(
        ticker,
        range = %request.range,
        interval = %request.interval,
        "analysis pipeline started"
    );

    let series = provider
        .fetch_bars(ticker, request.range, request.interval)
        .await
        .map_err(|report| {
            let mapped = match report.current_context() {
                FetchError::NoData { .. } => PipelineError::NoData,
                other => PipelineError::Fetch {
                    message: other.to_string(),
                },
            };
            report.change_context(mapped)
        })?;

    let enriched = enrich(series).map_err(|report| {
        let message = report.current_context().to_string();
        report.change_context(PipelineError::Indicator { message })
    })?;

    let path = renderer.render(&enriched).map_err(|report| {
        let message = report.current_context().to_string();
        report.change_context(PipelineError::Render { message })
    })?;

    Ok(path)
}
