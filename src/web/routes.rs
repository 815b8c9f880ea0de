use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use super::{auth, content, generate, google, research, settings, AppState};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        // Session management
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Content calendar
        .route(
            "/api/content",
            get(content::list)
                .post(content::create)
                .patch(content::update)
                .delete(content::remove),
        )
        .route("/api/approve-content", post(content::approve))
        // Weekly generation
        .route("/api/generate-week", post(generate::generate_week))
        .route("/api/generation-jobs", get(generate::list_jobs))
        // Research sources
        .route(
            "/api/research-urls",
            get(research::list_urls)
                .post(research::create_url)
                .patch(research::update_url)
                .delete(research::delete_url),
        )
        .route("/api/research-urls/scrape-now", post(research::scrape_now))
        .route("/api/research-content", get(research::list_content))
        // Settings
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        // Google Calendar
        .route("/api/auth/google", get(google::oauth_start))
        .route("/api/auth/google/callback", get(google::oauth_callback))
        .route("/api/sync-calendar", post(google::sync_calendar))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
