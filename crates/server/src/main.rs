use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_core::{
    load_config, validate_config, BatchScheduler, Clock, HttpTranscodeWorker, ItemProcessor,
    MediaStore, MigrationController, ProcessingService, SqliteMediaStore, TokioClock,
    TranscodeWorker,
};
use reelforge_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REELFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);

    // Status store
    let store: Arc<dyn MediaStore> = Arc::new(
        SqliteMediaStore::new(&config.database.path).context("Failed to open media store")?,
    );
    info!("Media store initialized");

    // Transcode worker
    let worker: Arc<dyn TranscodeWorker> = Arc::new(
        HttpTranscodeWorker::new(config.worker.clone())
            .context("Failed to create transcode worker client")?,
    );
    match worker.health_check().await {
        Ok(()) => info!("Transcode worker reachable at {}", config.worker.url),
        Err(e) => warn!(
            "Transcode worker at {} not reachable yet: {}",
            config.worker.url, e
        ),
    }

    let clock: Arc<dyn Clock> = Arc::new(TokioClock);

    let processor = Arc::new(ItemProcessor::new(
        config.processor.clone(),
        Arc::clone(&store),
        Arc::clone(&worker),
    ));

    // Items left in Processing by a previous run can never finish
    let recovered = processor
        .recover_interrupted()
        .context("Failed to recover interrupted items")?;
    if recovered > 0 {
        warn!("Marked {} interrupted item(s) as failed", recovered);
    }

    let scheduler = Arc::new(BatchScheduler::new(
        config.scheduler.clone(),
        Arc::clone(&processor),
        Arc::clone(&clock),
    ));
    if config.scheduler.enabled {
        scheduler.start();
        info!(
            "Batch scheduler started (every {}ms, up to {} items)",
            config.scheduler.poll_interval_ms, config.scheduler.batch_size
        );
    } else {
        info!("Batch scheduler disabled, batches run on request only");
    }

    let migration = Arc::new(MigrationController::new(
        config.migration.clone(),
        Arc::clone(&processor),
        clock,
    ));

    let service = ProcessingService::new(
        store,
        processor,
        Arc::clone(&scheduler),
        Arc::clone(&migration),
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, service));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down");

    scheduler.stop();
    scheduler.wait().await;
    if migration.stop() {
        info!("Waiting for migration to reach an item boundary");
        let run = migration.wait().await;
        info!(
            "Migration stopped: {}/{} processed",
            run.processed_count, run.total_eligible
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
