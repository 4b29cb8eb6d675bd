//! Anomaly API Server
//!
//! Serves sea-surface-temperature anomaly fields for the reporting dashboard.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use anomaly_api::state::AppState;
use anomaly_resolver::ResolverConfig;

/// Anomaly API Server
#[derive(Parser, Debug)]
#[command(name = "anomaly-api")]
#[command(about = "HTTP server for sea-surface-temperature anomaly fields")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8085", env = "SST_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// YAML resolver config; SST_* environment variables are used when absent
    #[arg(short, long, env = "SST_CONFIG")]
    config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, env = "SST_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting anomaly API server");

    let config = match &args.config {
        Some(path) => ResolverConfig::load_from_file(path)?,
        None => ResolverConfig::from_env(),
    };

    // Initialize application state
    let state = AppState::new(&config)
        .context("Failed to initialize application state")?
        .with_metrics(prometheus_handle);

    let app = anomaly_api::router(Arc::new(state));

    // Parse listen address
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Anomaly API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
