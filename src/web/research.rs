use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, AppState};
use crate::auth::RequireUser;
use crate::db::{self, ResearchUrl, ResearchUrlUpdate, ScrapeFrequency, UrlCategory};

/// The camelCase client view of a research URL row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchUrlView {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub category: String,
    pub scrape_frequency: String,
    pub is_active: bool,
    pub last_scraped: Option<String>,
    pub created_at: String,
}

impl From<ResearchUrl> for ResearchUrlView {
    fn from(row: ResearchUrl) -> Self {
        Self {
            id: row.id,
            url: row.url,
            title: row.title,
            category: row.category,
            scrape_frequency: row.scrape_frequency,
            is_active: row.is_active,
            last_scraped: row.last_scraped,
            created_at: row.created_at,
        }
    }
}

/// GET /api/research-urls - all of the user's research sources.
pub async fn list_urls(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    let urls = db::list_research_urls(state.db.pool(), user.id).await?;
    let views: Vec<ResearchUrlView> = urls.into_iter().map(Into::into).collect();

    Ok(Json(views).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchUrlCreate {
    url: String,
    title: String,
    category: UrlCategory,
    scrape_frequency: ScrapeFrequency,
}

/// POST /api/research-urls - register a source to scrape.
pub async fn create_url(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ResearchUrlCreate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if url::Url::parse(&input.url).is_err() {
        return Err(ApiError::BadRequest("url must be a valid URL".to_string()));
    }
    if input.title.is_empty() {
        return Err(ApiError::BadRequest("title cannot be empty".to_string()));
    }

    let row = db::insert_research_url(
        state.db.pool(),
        &db::NewResearchUrl {
            user_id: user.id,
            url: input.url,
            title: input.title,
            category: input.category,
            scrape_frequency: input.scrape_frequency,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ResearchUrlView::from(row))).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchUrlPatch {
    id: i64,
    url: Option<String>,
    title: Option<String>,
    category: Option<UrlCategory>,
    scrape_frequency: Option<ScrapeFrequency>,
    is_active: Option<bool>,
}

/// PATCH /api/research-urls - partial update by id in the body.
pub async fn update_url(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ResearchUrlPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if let Some(raw) = &input.url {
        if url::Url::parse(raw).is_err() {
            return Err(ApiError::BadRequest("url must be a valid URL".to_string()));
        }
    }
    if input.title.as_deref() == Some("") {
        return Err(ApiError::BadRequest("title cannot be empty".to_string()));
    }

    let update = ResearchUrlUpdate {
        url: input.url,
        title: input.title,
        category: input.category,
        scrape_frequency: input.scrape_frequency,
        is_active: input.is_active,
    };

    let row = db::update_research_url(state.db.pool(), input.id, user.id, &update)
        .await?
        .ok_or(ApiError::NotFound("Research URL not found"))?;

    Ok(Json(ResearchUrlView::from(row)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    id: Option<i64>,
}

/// DELETE /api/research-urls?id= - owner-scoped delete.
pub async fn delete_url(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(params): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing id parameter".to_string()))?;

    if !db::delete_research_url(state.db.pool(), id, user.id).await? {
        return Err(ApiError::NotFound("Research URL not found"));
    }

    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeNowRequest {
    url_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeResultView {
    id: i64,
    summary: Option<String>,
    is_new: bool,
}

/// POST /api/research-urls/scrape-now - scrape specific URLs or all
/// active ones. Per-URL failures are collected, never a batch error.
pub async fn scrape_now(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ScrapeNowRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if let Some(url_ids) = input.url_ids.filter(|ids| !ids.is_empty()) {
        let mut results = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for url_id in url_ids {
            match state.scraper.scrape_and_store(url_id, user.id).await {
                Ok(record) => results.push(ScrapeResultView {
                    id: record.id,
                    summary: record.summary,
                    is_new: record.is_new,
                }),
                Err(e) => errors.push(format!("{url_id}: {e:#}")),
            }
        }

        return Ok(Json(json!({
            "scraped": results.len(),
            "failed": errors.len(),
            "results": results,
            "errors": errors,
        }))
        .into_response());
    }

    let outcome = state.scraper.scrape_all_active(user.id).await?;

    Ok(Json(json!({
        "scraped": outcome.scraped,
        "failed": outcome.failed,
        "errors": outcome.errors,
    }))
    .into_response())
}

/// The camelCase client view of a research snippet with its source.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchContentView {
    pub id: i64,
    pub summary: Option<String>,
    pub scraped_at: String,
    pub category: String,
    pub title: String,
    pub url: String,
}

/// GET /api/research-content - recent snippets, newest first.
pub async fn list_content(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    // A generous window: everything scraped in the last 90 days.
    let since = (chrono::Utc::now() - chrono::Duration::days(90))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let rows = db::recent_research_content(state.db.pool(), user.id, &since, 50).await?;
    let views: Vec<ResearchContentView> = rows
        .into_iter()
        .map(|row| ResearchContentView {
            id: row.id,
            summary: row.summary,
            scraped_at: row.scraped_at,
            category: row.category,
            title: row.title,
            url: row.url,
        })
        .collect();

    Ok(Json(views).into_response())
}
