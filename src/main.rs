use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use content_calendar::auth;
use content_calendar::config::Config;
use content_calendar::db::Database;
use content_calendar::generation::scheduler;
use content_calendar::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting content-calendar");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match (
        config.anthropic_api_key.is_some(),
        config.openai_api_key.is_some(),
        config.grok_api_key.is_some(),
    ) {
        (true, true, true) => info!("All AI provider keys configured"),
        (anthropic, openai, grok) => {
            info!(
                anthropic,
                openai, grok, "Some AI provider keys are missing; affected platforms will fail"
            );
        }
    }

    if config.google_calendar_configured() {
        info!("Google Calendar sync enabled");
    } else {
        info!("Google Calendar sync disabled (no credentials)");
    }

    // Ensure the database directory exists
    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    // Initialize database
    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    let scheduler_enabled = config.scheduler_enabled;
    let scheduler_interval = config.scheduler_poll_interval;

    // Wire up clients and background workers
    let state = AppState::new(config, db.clone());

    // Start session cleanup in background
    let cleanup_db = db.clone();
    let cleanup_handle = tokio::spawn(async move {
        auth::session_cleanup_loop(cleanup_db).await;
    });

    // Start the weekly generation scheduler if enabled
    let scheduler_handle = if scheduler_enabled {
        let generator = Arc::clone(&state.generator);
        Some(tokio::spawn(async move {
            scheduler::run_loop(db, generator, scheduler_interval).await;
        }))
    } else {
        info!("Weekly generation scheduler disabled");
        None
    };

    // Start web server in background
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(state).await {
            error!("Web server error: {e:#}");
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down...");

    // Cancel tasks
    web_handle.abort();
    cleanup_handle.abort();
    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,content_calendar=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
