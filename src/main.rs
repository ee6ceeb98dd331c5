mod chart;
mod config;
mod enrich;
mod error;
mod indicator;
mod model;
mod pipeline;
mod provider;
mod server;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chart::ChartRenderer;
use config::AppConfig;
use provider::MarketData;
use provider::yahoo::YahooProvider;
use server::AppState;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("chart output directory error")]
    OutputDir,
    #[display("server error")]
    Server,
}

#[derive(Parser)]
#[command(name = "stock-charter", about = "Stock ticker analysis and charting service")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    // ── Chart output directory (one-time initialization) ─────────────────────
    let charts_dir = &config.general.charts_dir;
    std::fs::create_dir_all(charts_dir)
        .change_context(AppError::OutputDir)
        .attach_with(|| format!("charts_dir: {charts_dir}"))?;

    // ── Pipeline components ───────────────────────────────────────────────────
    let provider: Arc<dyn MarketData> = Arc::new(YahooProvider::new(
        config.provider.base_url.clone(),
        config.provider.requests_per_second,
    ));
    let renderer = Arc::new(ChartRenderer::new(charts_dir));

    let app = server::router(AppState { provider, renderer });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .change_context(AppError::Server)
        .attach_with(|| format!("bind_addr: {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        charts_dir = %charts_dir,
        "stock-charter listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .change_context(AppError::Server)?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl+c received, shutting down");
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
