use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, AppState};
use crate::auth::{
    generate_session_token, hash_password, validate_password_strength, verify_password,
    RequireUser, SessionDuration, SESSION_COOKIE,
};
use crate::db as queries;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
}

/// POST /auth/register - create an account.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    if !input.email.contains('@') {
        return Err(ApiError::BadRequest("email must be a valid email".to_string()));
    }
    validate_password_strength(&input.password).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let pool = state.db.pool();

    if queries::get_user_by_email(pool, &input.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(&input.password)?;
    let user_id = queries::create_user(pool, &input.email, &password_hash).await?;

    tracing::info!(user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user_id, "email": input.email })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
    #[serde(default)]
    remember: bool,
}

/// POST /auth/login - verify credentials and set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body.map_err(|_| ApiError::BadRequest("Invalid request".to_string()))?;

    let pool = state.db.pool();

    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid email or password" })),
        )
            .into_response()
    };

    let Some(user) = queries::get_user_by_email(pool, &input.email).await? else {
        return Ok(invalid());
    };

    if !verify_password(&input.password, &user.password_hash)? {
        return Ok(invalid());
    }

    let duration = if input.remember {
        SessionDuration::Long
    } else {
        SessionDuration::Short
    };
    let token = generate_session_token();
    let expires_at = (Utc::now() + Duration::seconds(duration.as_seconds())).to_rfc3339();

    queries::create_session(pool, user.id, &token, &expires_at).await?;

    let max_age = duration.as_seconds();
    let cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "id": user.id, "email": user.email })),
    )
        .into_response())
}

/// POST /auth/logout - delete the current session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    RequireUser(_user): RequireUser,
) -> Result<Response, ApiError> {
    let token = headers
        .get("cookie")
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .find_map(|c| c.trim().strip_prefix("session=").map(String::from))
        });

    if let Some(token) = token {
        queries::delete_session(state.db.pool(), &token).await?;
    }

    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true })),
    )
        .into_response())
}
