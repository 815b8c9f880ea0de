use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, AppState};
use crate::auth::RequireUser;
use crate::db::{self, GenerationJob, Platform};
use crate::generation::GenerateWeekParams;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWeekRequest {
    /// YYYY-MM-DD (Monday)
    start_date: String,
    platforms: Option<Vec<Platform>>,
    research_first: Option<bool>,
    auto_approve: Option<bool>,
}

/// POST /api/generate-week - run the weekly generation job and return its
/// terminal summary.
pub async fn generate_week(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<GenerateWeekRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if NaiveDate::parse_from_str(&input.start_date, "%Y-%m-%d").is_err() {
        return Err(ApiError::BadRequest(
            "startDate must be YYYY-MM-DD".to_string(),
        ));
    }

    let params = GenerateWeekParams {
        start_date: input.start_date,
        platforms: input.platforms,
        research_first: input.research_first.unwrap_or(true),
        auto_approve: input.auto_approve.unwrap_or(false),
    };

    let outcome = state.generator.generate_week(user.id, &params).await?;

    Ok(Json(json!({
        "jobId": outcome.job_id,
        "status": outcome.status,
        "itemsGenerated": outcome.items_generated,
        "itemsFailed": outcome.items_failed,
        "contentItems": outcome.items,
    }))
    .into_response())
}

/// The camelCase client view of a generation job row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJobView {
    pub id: i64,
    pub status: String,
    pub week_start_date: String,
    pub items_generated: i64,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl From<GenerationJob> for GenerationJobView {
    fn from(job: GenerationJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            week_start_date: job.week_start_date,
            items_generated: job.items_generated,
            error_message: job.error_message,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// GET /api/generation-jobs - the user's recent jobs, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    let jobs = db::list_generation_jobs(state.db.pool(), user.id, 20).await?;
    let views: Vec<GenerationJobView> = jobs.into_iter().map(Into::into).collect();

    Ok(Json(views).into_response())
}
