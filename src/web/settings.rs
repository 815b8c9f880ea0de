use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::auth::RequireUser;
use crate::db::{self, SettingsUpdate, User};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub weekly_generation_day: i64,
    pub weekly_generation_time: String,
    pub auto_approve_enabled: bool,
    pub notification_email: String,
    pub forbidden_phrases: Vec<String>,
    pub google_calendar_connected: bool,
}

async fn load_settings_view(state: &AppState, user: &User) -> Result<SettingsView, ApiError> {
    let pool = state.db.pool();

    let settings = db::get_user_settings(pool, user.id).await?;
    let phrases = db::list_forbidden_phrases(pool, user.id).await?;

    Ok(match settings {
        Some(s) => SettingsView {
            weekly_generation_day: s.weekly_generation_day,
            weekly_generation_time: s.weekly_generation_time,
            auto_approve_enabled: s.auto_approve_enabled,
            notification_email: s
                .notification_email
                .unwrap_or_else(|| user.email.clone()),
            forbidden_phrases: phrases,
            google_calendar_connected: s.google_refresh_token.is_some(),
        },
        // Defaults for users who never saved settings
        None => SettingsView {
            weekly_generation_day: 0,
            weekly_generation_time: "18:00".to_string(),
            auto_approve_enabled: false,
            notification_email: user.email.clone(),
            forbidden_phrases: phrases,
            google_calendar_connected: false,
        },
    })
}

/// GET /api/settings - the user's settings singleton (with defaults).
pub async fn get_settings(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    let view = load_settings_view(&state, &user).await?;
    Ok(Json(view).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPut {
    weekly_generation_day: Option<i64>,
    weekly_generation_time: Option<String>,
    auto_approve_enabled: Option<bool>,
    notification_email: Option<String>,
    forbidden_phrases: Option<Vec<String>>,
}

/// PUT /api/settings - upsert settings; replaces the forbidden-phrase
/// set when one is provided.
pub async fn put_settings(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: Result<Json<SettingsPut>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if let Some(day) = input.weekly_generation_day {
        if !(0..=6).contains(&day) {
            return Err(ApiError::BadRequest(
                "weeklyGenerationDay must be between 0 and 6".to_string(),
            ));
        }
    }
    if let Some(email) = &input.notification_email {
        if !email.contains('@') {
            return Err(ApiError::BadRequest(
                "notificationEmail must be a valid email".to_string(),
            ));
        }
    }

    let pool = state.db.pool();

    db::upsert_user_settings(
        pool,
        user.id,
        &SettingsUpdate {
            weekly_generation_day: input.weekly_generation_day,
            weekly_generation_time: input.weekly_generation_time,
            auto_approve_enabled: input.auto_approve_enabled,
            notification_email: input.notification_email,
        },
    )
    .await?;

    if let Some(phrases) = &input.forbidden_phrases {
        db::replace_forbidden_phrases(pool, user.id, phrases).await?;
    }

    let view = load_settings_view(&state, &user).await?;
    Ok(Json(view).into_response())
}
