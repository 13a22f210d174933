//! JobRadar Scheduler
//!
//! This binary runs the background pipeline: scheduled ingestion and
//! enrichment triggers, hourly alert checks, notification dispatch,
//! cleanup, and the daily report. It stays up until Ctrl-C.

use anyhow::{Context, Result};
use radar_core::config::Config;
use radar_core::kernel::{ServerDeps, TaskOrchestrator};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,radar_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting JobRadar scheduler");

    let config = Config::from_env().context("Failed to load configuration")?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let deps = ServerDeps::production(pool, &config)?;
    let orchestrator = TaskOrchestrator::new(deps);
    orchestrator.start().await.context("Failed to start task orchestrator")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    orchestrator.stop().await?;

    Ok(())
}
