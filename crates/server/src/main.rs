use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidstage_core::{
    load_config, load_config_from_env, validate_config, BroadcastSink, Config, FanoutSink,
    FfmpegEngine, FsStorageGate, JobOrchestrator, LogSink, StatusSink, StorageGate,
};
use vidstage_server::{create_router, AppState};

/// Capacity of the WebSocket status feed
const STATUS_FEED_CAPACITY: usize = 256;

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
    let config_path = std::env::var("VIDSTAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load(&config_path)?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Temp directory: {:?}", config.storage.temp_dir);
    info!("Output directory: {:?}", config.storage.output_dir);
    info!("Engine: {:?}", config.engine.ffmpeg_path);

    // Storage gate; the access signal is shared with the API
    let gate = Arc::new(FsStorageGate::new(config.storage.clone()));
    let storage_access = gate.access();
    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));

    // Status events go to the log and to WebSocket clients
    let status_feed = BroadcastSink::new(STATUS_FEED_CAPACITY);
    let sink = FanoutSink::new()
        .with(Arc::new(LogSink))
        .with(Arc::new(status_feed.clone()));
    let sink: Arc<dyn StatusSink> = Arc::new(sink);

    let orchestrator = JobOrchestrator::new(
        config.job.clone(),
        gate as Arc<dyn StorageGate>,
        engine,
        sink,
    );
    match orchestrator.engine_version().await {
        Some(version) => info!("Engine {} version {}", orchestrator.engine_name(), version),
        None => warn!(
            "Engine {} did not report a version",
            orchestrator.engine_name()
        ),
    }
    match orchestrator.verify_storage() {
        Ok(dirs) => info!(
            "Job {} ready (temp: {:?}, output: {:?})",
            orchestrator.job_id(),
            dirs.temp_dir,
            dirs.output_dir
        ),
        Err(e) => warn!(
            "Job {} created but storage is unavailable: {}",
            orchestrator.job_id(),
            e
        ),
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        orchestrator,
        status_feed,
        storage_access,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Load the config file, falling back to defaults and environment when it is absent.
fn load(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))
    } else {
        info!(
            "No configuration file at {:?}, using defaults and environment",
            config_path
        );
        load_config_from_env().context("Failed to load config from environment")
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
