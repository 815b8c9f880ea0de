mod auth;
mod content;
mod error;
mod generate;
mod google;
mod research;
mod routes;
mod settings;

pub use error::ApiError;
pub use routes::router;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ai::AiRouter;
use crate::calendar::GoogleCalendar;
use crate::config::Config;
use crate::db::Database;
use crate::generation::WeeklyGenerator;
use crate::research::ResearchScraper;
use crate::vectors::{start_embedding_worker, EmbeddingQueue};

/// Shared application state. All external clients are constructed once
/// here and passed in, never reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub ai: Arc<AiRouter>,
    pub calendar: Arc<GoogleCalendar>,
    pub scraper: Arc<ResearchScraper>,
    pub embeddings: EmbeddingQueue,
    pub generator: Arc<WeeklyGenerator>,
}

impl AppState {
    /// Wire up all clients and background workers from a config.
    #[must_use]
    pub fn new(config: Config, db: Database) -> Self {
        let ai = Arc::new(AiRouter::new(&config));
        let calendar = Arc::new(GoogleCalendar::new(&config));
        let scraper = Arc::new(ResearchScraper::new(
            &config,
            db.clone(),
            ai.anthropic().clone(),
        ));
        let embeddings = start_embedding_worker(db.clone(), ai.openai().clone());
        let generator = Arc::new(WeeklyGenerator::new(
            db.clone(),
            Arc::clone(&ai),
            Arc::clone(&scraper),
            embeddings.clone(),
        ));

        Self {
            db,
            config: Arc::new(config),
            ai,
            calendar,
            scraper,
            embeddings,
            generator,
        }
    }
}

// Session extractors only need the pool.
impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db.pool().clone()
    }
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.web_host, state.config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(state);

    info!(addr = %addr, "Starting web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
#[must_use]
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
