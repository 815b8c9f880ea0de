use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, AppState};
use crate::auth::RequireUser;
use crate::db::{
    self, ContentFilter, ContentItem, ContentStatus, ContentType, ContentUpdate, Platform,
};

/// The camelCase client view of a stored content row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemView {
    pub id: i64,
    pub platform: String,
    pub content_type: String,
    pub topic: String,
    pub generated_text: String,
    pub publish_date: String,
    pub publish_time: String,
    pub status: String,
    pub owner: String,
    pub calendar_event_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContentItem> for ContentItemView {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            platform: item.platform,
            content_type: item.content_type,
            topic: item.topic,
            generated_text: item.generated_text,
            publish_date: item.publish_date,
            publish_time: item.publish_time,
            status: item.status,
            owner: item.owner,
            calendar_event_id: item.calendar_event_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    status: Option<ContentStatus>,
    platform: Option<Platform>,
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/content - list the user's items, filterable and paginated.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) =
        query.map_err(|_| ApiError::BadRequest("Invalid query parameters".to_string()))?;

    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);
    if !(1..=100).contains(&limit) || offset < 0 {
        return Err(ApiError::BadRequest("Invalid query parameters".to_string()));
    }

    let filter = ContentFilter {
        status: params.status,
        platform: params.platform,
        start_date: params.start_date,
        end_date: params.end_date,
        limit,
        offset,
    };

    let items = db::list_content(state.db.pool(), user.id, &filter).await?;
    let views: Vec<ContentItemView> = items.into_iter().map(Into::into).collect();

    Ok(Json(views).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCreate {
    platform: Platform,
    content_type: ContentType,
    topic: String,
    generated_text: String,
    publish_date: String,
    publish_time: String,
    status: Option<ContentStatus>,
    owner: String,
}

/// POST /api/content - create an item.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ContentCreate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if input.topic.is_empty() {
        return Err(ApiError::BadRequest("topic cannot be empty".to_string()));
    }

    let item = db::insert_content(
        state.db.pool(),
        &db::NewContentItem {
            user_id: user.id,
            platform: input.platform,
            content_type: input.content_type,
            topic: input.topic,
            generated_text: input.generated_text,
            publish_date: input.publish_date,
            publish_time: input.publish_time,
            status: input.status.unwrap_or(ContentStatus::Draft),
            owner: input.owner,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ContentItemView::from(item))).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    id: i64,
    platform: Option<Platform>,
    content_type: Option<ContentType>,
    topic: Option<String>,
    generated_text: Option<String>,
    publish_date: Option<String>,
    publish_time: Option<String>,
    status: Option<ContentStatus>,
    owner: Option<String>,
}

/// PATCH /api/content - partial update by id in the body.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ContentPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if input.topic.as_deref() == Some("") {
        return Err(ApiError::BadRequest("topic cannot be empty".to_string()));
    }

    let update = ContentUpdate {
        platform: input.platform,
        content_type: input.content_type,
        topic: input.topic,
        generated_text: input.generated_text,
        publish_date: input.publish_date,
        publish_time: input.publish_time,
        status: input.status,
        owner: input.owner,
    };

    let item = db::update_content(state.db.pool(), input.id, user.id, &update)
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;

    Ok(Json(ContentItemView::from(item)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    id: Option<i64>,
}

/// DELETE /api/content?id= - owner-scoped delete.
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(params): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing or invalid id parameter".to_string()))?;

    if !db::delete_content(state.db.pool(), id, user.id).await? {
        return Err(ApiError::NotFound("Content not found"));
    }

    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    content_id: i64,
}

/// POST /api/approve-content - conditional draft-to-approved transition.
/// Approving anything that is not the user's own draft returns 404 and
/// never mutates status.
pub async fn approve(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    let item = db::approve_draft(state.db.pool(), input.content_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Content not found or not in draft status"))?;

    Ok(Json(ContentItemView::from(item)).into_response())
}
