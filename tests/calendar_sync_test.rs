//! Integration tests for Google Calendar sync and the OAuth callback.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_calendar::config::Config;
use content_calendar::db::{
    get_content, get_google_refresh_token, insert_content, set_google_refresh_token,
    ContentStatus, ContentType, Database, NewContentItem, Platform,
};
use content_calendar::web::{create_app, AppState};

struct TestHarness {
    app: Router,
    db: Database,
    _temp_dir: TempDir,
}

async fn setup(google: &MockServer) -> TestHarness {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let config = Config {
        google_client_id: Some("client-id".to_string()),
        google_client_secret: Some("client-secret".to_string()),
        google_token_url: format!("{}/token", google.uri()),
        google_api_base: google.uri(),
        ..Config::for_testing()
    };

    TestHarness {
        app: create_app(AppState::new(config, db.clone())),
        db,
        _temp_dir: temp_dir,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&body).expect("Response was not JSON")
}

/// Register + login, returning (user_id, session cookie).
async fn register_and_login(app: &Router, email: &str) -> (i64, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": "a-long-enough-password" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": "a-long-enough-password" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    (user_id, cookie)
}

async fn create_approved_item(db: &Database, user_id: i64) -> i64 {
    insert_content(
        db.pool(),
        &NewContentItem {
            user_id,
            platform: Platform::LinkedIn,
            content_type: ContentType::Market,
            topic: "Utah housing market update".to_string(),
            generated_text: "The market is moving.".to_string(),
            publish_date: "2026-03-02".to_string(),
            publish_time: "10:00 AM".to_string(),
            status: ContentStatus::Approved,
            owner: "Liz Sears".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn mount_event_insert(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-123",
            "htmlLink": "https://calendar.google.com/event?eid=evt-123"
        })))
        .mount(server)
        .await;
}

async fn sync(app: &Router, cookie: &str, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync-calendar")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sync_with_access_token_schedules_item() {
    let google = MockServer::start().await;
    mount_event_insert(&google).await;

    let harness = setup(&google).await;
    let (user_id, cookie) = register_and_login(&harness.app, "liz@example.com").await;
    let content_id = create_approved_item(&harness.db, user_id).await;

    let response = sync(
        &harness.app,
        &cookie,
        json!({ "contentId": content_id, "accessToken": "direct-token" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["calendarEventId"], "evt-123");

    let item = get_content(harness.db.pool(), content_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.status, "scheduled");
    assert_eq!(item.calendar_event_id.as_deref(), Some("evt-123"));
}

#[tokio::test]
async fn test_sync_without_any_token_is_403_and_leaves_item_alone() {
    let google = MockServer::start().await;

    let harness = setup(&google).await;
    let (user_id, cookie) = register_and_login(&harness.app, "liz@example.com").await;
    let content_id = create_approved_item(&harness.db, user_id).await;

    let response = sync(&harness.app, &cookie, json!({ "contentId": content_id })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let item = get_content(harness.db.pool(), content_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.status, "approved");
    assert!(item.calendar_event_id.is_none());
}

#[tokio::test]
async fn test_sync_with_stored_refresh_token() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "refreshed-token"
        })))
        .mount(&google)
        .await;
    mount_event_insert(&google).await;

    let harness = setup(&google).await;
    let (user_id, cookie) = register_and_login(&harness.app, "liz@example.com").await;
    let content_id = create_approved_item(&harness.db, user_id).await;

    set_google_refresh_token(harness.db.pool(), user_id, "stored-refresh")
        .await
        .unwrap();

    let response = sync(&harness.app, &cookie, json!({ "contentId": content_id })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let item = get_content(harness.db.pool(), content_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.status, "scheduled");
    assert_eq!(item.calendar_event_id.as_deref(), Some("evt-123"));
}

#[tokio::test]
async fn test_sync_foreign_content_is_404() {
    let google = MockServer::start().await;
    mount_event_insert(&google).await;

    let harness = setup(&google).await;
    let (owner_id, _) = register_and_login(&harness.app, "liz@example.com").await;
    let (_, other_cookie) = register_and_login(&harness.app, "intruder@example.com").await;
    let content_id = create_approved_item(&harness.db, owner_id).await;

    let response = sync(
        &harness.app,
        &other_cookie,
        json!({ "contentId": content_id, "accessToken": "direct-token" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_callback_stores_refresh_token() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1"
        })))
        .mount(&google)
        .await;

    let harness = setup(&google).await;
    let (user_id, _cookie) = register_and_login(&harness.app, "liz@example.com").await;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/auth/google/callback?code=auth-code&state={user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.ends_with("/settings?google=connected"));

    let token = get_google_refresh_token(harness.db.pool(), user_id).await.unwrap();
    assert_eq!(token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_oauth_callback_without_refresh_token_redirects_error() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1"
        })))
        .mount(&google)
        .await;

    let harness = setup(&google).await;
    let (user_id, _cookie) = register_and_login(&harness.app, "liz@example.com").await;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/auth/google/callback?code=auth-code&state={user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.ends_with("/settings?google=error"));

    let token = get_google_refresh_token(harness.db.pool(), user_id).await.unwrap();
    assert!(token.is_none());
}

#[tokio::test]
async fn test_oauth_start_redirects_to_consent_url() {
    let google = MockServer::start().await;

    let harness = setup(&google).await;
    let (_, cookie) = register_and_login(&harness.app, "liz@example.com").await;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/google")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
    assert!(location.contains("access_type=offline"));
    assert!(location.contains("client_id=client-id"));
}
