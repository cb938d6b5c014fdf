use anyhow::{Context, Result};
use axum::serve;
use cote_utils::{init_logging, AppConfig, BulletinParser, BulletinValidator};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

mod cache;
mod clock;
mod fetcher;
mod handlers;
mod metrics;
mod middleware;
mod pdf_processor;
mod pipeline;
mod routes;
mod scheduler;
mod state_machine;

use cache::SnapshotCache;
use clock::{Clock, SystemClock};
use fetcher::HttpFetcher;
use metrics::PipelineMetrics;
use pdf_processor::PdfProcessor;
use pipeline::Pipeline;
use scheduler::PipelineScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });
    config.validate()?;

    // Initialize logging
    init_logging(&config.logging)?;
    info!(source = %config.source.url, "Starting Cote bulletin service");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = SnapshotCache::new();
    let metrics = PipelineMetrics::new().context("Failed to register pipeline metrics")?;

    let fetcher = HttpFetcher::from_config(&config.source, Arc::clone(&clock))?;
    let pipeline = Pipeline::new(
        Arc::new(fetcher),
        Arc::new(PdfProcessor::new()),
        BulletinParser::from_config(&config.parser)?,
        BulletinValidator::new(config.parser.max_abs_value),
        cache.clone(),
        Arc::clone(&clock),
        config.scheduler.max_run(),
    );
    let scheduler = Arc::new(PipelineScheduler::new(
        pipeline,
        config.scheduler.clone(),
        metrics.clone(),
        Arc::clone(&clock),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    let state = AppState {
        cache,
        scheduler,
        config: Arc::new(config.clone()),
        metrics,
        clock,
    };
    let app = routes::create_router(state);

    // Start server
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!("Bulletin service listening on {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    scheduler_task.await.context("Scheduler task panicked")?;
    info!("Bulletin service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(Clone)]
pub struct AppState {
    pub cache: SnapshotCache,
    pub scheduler: Arc<PipelineScheduler>,
    pub config: Arc<AppConfig>,
    pub metrics: PipelineMetrics,
    pub clock: Arc<dyn Clock>,
}
