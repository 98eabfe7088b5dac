//! gridwatch-proc - Capture Processing Service
//!
//! Ingests power-quality waveform captures from the InfluxDB waveform store,
//! computes their Modified Stockwell Transform and persists the resulting
//! spectrograms in the SQLite result store for later manual classification.
//! Processing is triggered per capture over HTTP.

use anyhow::Result;
use clap::Parser;
use gridwatch_proc::config::{Args, ServiceConfig};
use gridwatch_proc::services::{InfluxSource, Pipeline};
use gridwatch_proc::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting gridwatch-proc (capture processing)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve and prepare the data folder
    let data_folder =
        gridwatch_common::config::resolve_data_folder(args.data_folder.as_deref(), "GRIDWATCH_DATA_FOLDER")?;
    gridwatch_common::config::ensure_data_folder(&data_folder)?;

    let service_config = ServiceConfig::load(args.config.as_deref())?;

    // Open or create the result store
    let db_path = data_folder.join("gridwatch.db");
    info!("Database: {}", db_path.display());
    let db_pool = gridwatch_proc::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Waveform source client, injected into the pipeline
    let source = Arc::new(InfluxSource::new(
        service_config.influx.clone(),
        service_config.processing.expected_samples,
    ));
    info!("Waveform store: {}", service_config.influx.url);

    let pipeline = Arc::new(Pipeline::new(
        db_pool.clone(),
        source,
        service_config.processing.clone(),
    ));

    let state = AppState::new(db_pool, pipeline);
    let app = gridwatch_proc::build_router(state);

    let bind_addr = args.bind.unwrap_or_else(|| service_config.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
