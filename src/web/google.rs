use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::auth::RequireUser;
use crate::calendar::{CalendarError, EventDetails};
use crate::db::{self, Platform};

/// GET /api/auth/google - start the OAuth consent flow. The user id rides
/// in the `state` parameter and comes back on the callback.
pub async fn oauth_start(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    if !state.calendar.is_configured() {
        return Err(ApiError::NotConfigured("Google Calendar"));
    }

    let url = state
        .calendar
        .authorization_url(&user.id.to_string())
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Redirect::temporary(&url).into_response())
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
}

/// GET /api/auth/google/callback - authorization-code exchange. Stores
/// the long-lived refresh token; every failure redirects back to the
/// settings page with an error flag.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallback>,
) -> Response {
    let settings_url = |outcome: &str| {
        Redirect::temporary(&format!("{}/settings?google={outcome}", state.config.site_url))
            .into_response()
    };

    let (Some(code), Some(user_state)) = (params.code, params.state) else {
        return settings_url("error");
    };
    let Ok(user_id) = user_state.parse::<i64>() else {
        return settings_url("error");
    };

    let tokens = match state.calendar.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("Google OAuth code exchange failed: {e:#}");
            return settings_url("error");
        }
    };

    let Some(refresh_token) = tokens.refresh_token else {
        warn!(user_id, "Google OAuth response had no refresh token");
        return settings_url("error");
    };

    if let Err(e) = db::set_google_refresh_token(state.db.pool(), user_id, &refresh_token).await {
        warn!(user_id, "Failed to store Google refresh token: {e:#}");
        return settings_url("error");
    }

    info!(user_id, "Google Calendar connected");
    settings_url("connected")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    content_id: i64,
    access_token: Option<String>,
}

/// POST /api/sync-calendar - create one calendar event for a content item
/// and flip it to scheduled.
///
/// Token precedence: a caller-supplied access token wins; otherwise the
/// stored refresh token is exchanged for one. Neither present is a 403
/// and the item is left untouched.
pub async fn sync_calendar(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    if !state.calendar.is_configured() {
        return Err(ApiError::NotConfigured("Google Calendar"));
    }

    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    let content = db::get_content(state.db.pool(), input.content_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;

    let access_token = match input.access_token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            let refresh_token = db::get_google_refresh_token(state.db.pool(), user.id)
                .await?
                .ok_or_else(|| {
                    ApiError::Forbidden(
                        "No Google Calendar access. Connect Google Calendar in Settings."
                            .to_string(),
                    )
                })?;

            state
                .calendar
                .refresh_access_token(&refresh_token)
                .await
                .map_err(calendar_error)?
        }
    };

    let platform = Platform::from_str(&content.platform)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown platform: {}", content.platform)))?;

    let event = state
        .calendar
        .create_event(
            &access_token,
            &EventDetails {
                title: &content.topic,
                description: &content.generated_text,
                date: &content.publish_date,
                time: &content.publish_time,
                platform,
            },
        )
        .await
        .map_err(calendar_error)?;

    // The event already exists at this point; if this update fails the
    // calendar holds an event the local row doesn't know about.
    db::mark_content_scheduled(state.db.pool(), content.id, &event.event_id).await?;

    info!(
        content_id = content.id,
        event_id = %event.event_id,
        "Content synced to Google Calendar"
    );

    Ok(Json(json!({
        "success": true,
        "calendarEventId": event.event_id,
        "calendarUrl": event.html_link,
    }))
    .into_response())
}

fn calendar_error(e: CalendarError) -> ApiError {
    match e {
        CalendarError::NotConfigured => ApiError::NotConfigured("Google Calendar"),
        other => ApiError::Internal(other.into()),
    }
}
