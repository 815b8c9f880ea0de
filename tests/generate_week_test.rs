//! Integration tests for the weekly generation job, with all three AI
//! providers served by wiremock.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_calendar::config::Config;
use content_calendar::db::{
    create_user, list_content, list_generation_jobs, ContentFilter, Database, Platform,
};
use content_calendar::generation::GenerateWeekParams;
use content_calendar::web::AppState;

struct TestHarness {
    state: AppState,
    user_id: i64,
    _temp_dir: TempDir,
}

/// Build an app state whose provider base URLs point at the given mock
/// servers.
async fn setup(anthropic: &MockServer, openai: &MockServer, grok: &MockServer) -> TestHarness {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let user_id = create_user(db.pool(), "liz@example.com", "not-a-real-hash")
        .await
        .expect("Failed to create user");

    let config = Config {
        anthropic_api_key: Some("test-key".to_string()),
        anthropic_base_url: anthropic.uri(),
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: openai.uri(),
        grok_api_key: Some("test-key".to_string()),
        grok_base_url: grok.uri(),
        ..Config::for_testing()
    };

    TestHarness {
        state: AppState::new(config, db),
        user_id,
        _temp_dir: temp_dir,
    }
}

async fn mount_anthropic_ok(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": text }]
        })))
        .mount(server)
        .await;
}

async fn mount_chat_ok(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": text } }]
        })))
        .mount(server)
        .await;
}

async fn mount_embeddings_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3] }]
        })))
        .mount(server)
        .await;
}

fn week_params(start: &str) -> GenerateWeekParams {
    GenerateWeekParams {
        start_date: start.to_string(),
        platforms: None,
        research_first: false,
        auto_approve: false,
    }
}

#[tokio::test]
async fn test_full_week_generation() {
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);
    mount_anthropic_ok(&anthropic, "Long-form copy.").await;
    mount_chat_ok(&openai, "Social copy.").await;
    mount_embeddings_ok(&openai).await;
    mount_chat_ok(&grok, "X post.").await;

    let harness = setup(&anthropic, &openai, &grok).await;
    let outcome = harness
        .state
        .generator
        .generate_week(harness.user_id, &week_params("2026-03-02"))
        .await
        .expect("Job should run");

    assert_eq!(outcome.items_generated, 12);
    assert_eq!(outcome.items_failed, 0);
    assert_eq!(outcome.status.as_str(), "completed");

    // Every slot landed as a draft row inside the requested week
    let items = list_content(
        harness.state.db.pool(),
        harness.user_id,
        &ContentFilter {
            limit: 100,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(items.len(), 12);
    for item in &items {
        assert_eq!(item.status, "draft");
        assert!(item.publish_date.as_str() >= "2026-03-02");
        assert!(item.publish_date.as_str() <= "2026-03-08");
        assert_eq!(item.owner, "Liz Sears");
    }

    // Job row reflects the outcome
    let jobs = list_generation_jobs(harness.state.db.pool(), harness.user_id, 10)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, "completed");
    assert_eq!(jobs[0].items_generated, 12);
    assert!(jobs[0].error_message.is_none());
    assert!(jobs[0].completed_at.is_some());
}

#[tokio::test]
async fn test_platform_filter_generates_matching_slots_only() {
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);
    mount_anthropic_ok(&anthropic, "LinkedIn copy.").await;
    mount_embeddings_ok(&openai).await;

    let harness = setup(&anthropic, &openai, &grok).await;
    let params = GenerateWeekParams {
        platforms: Some(vec![Platform::LinkedIn]),
        ..week_params("2026-03-02")
    };
    let outcome = harness
        .state
        .generator
        .generate_week(harness.user_id, &params)
        .await
        .unwrap();

    // The template has exactly two LinkedIn slots
    assert_eq!(outcome.items_generated, 2);
    assert_eq!(outcome.items_failed, 0);
    assert!(outcome.items.iter().all(|i| i.platform == "LinkedIn"));
}

#[tokio::test]
async fn test_every_provider_failing_fails_the_job() {
    // No mocks mounted: every provider call 404s.
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);

    let harness = setup(&anthropic, &openai, &grok).await;
    let outcome = harness
        .state
        .generator
        .generate_week(harness.user_id, &week_params("2026-03-02"))
        .await
        .unwrap();

    assert_eq!(outcome.items_generated, 0);
    assert_eq!(outcome.items_failed, 12);
    assert_eq!(outcome.status.as_str(), "failed");

    let items = list_content(
        harness.state.db.pool(),
        harness.user_id,
        &ContentFilter {
            limit: 100,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(items.is_empty());

    let jobs = list_generation_jobs(harness.state.db.pool(), harness.user_id, 10)
        .await
        .unwrap();
    assert_eq!(jobs[0].status, "failed");
    assert_eq!(
        jobs[0].error_message.as_deref(),
        Some("12 items failed to generate")
    );
}

#[tokio::test]
async fn test_partial_failure_still_completes() {
    // Only OpenAI answers: IGFB and YouTube slots succeed, the rest fail.
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);
    mount_chat_ok(&openai, "Social copy.").await;
    mount_embeddings_ok(&openai).await;

    let harness = setup(&anthropic, &openai, &grok).await;
    let outcome = harness
        .state
        .generator
        .generate_week(harness.user_id, &week_params("2026-03-02"))
        .await
        .unwrap();

    // 7 IGFB slots + 1 YouTube slot
    assert_eq!(outcome.items_generated, 8);
    assert_eq!(outcome.items_failed, 4);
    assert_eq!(outcome.status.as_str(), "completed");

    let jobs = list_generation_jobs(harness.state.db.pool(), harness.user_id, 10)
        .await
        .unwrap();
    assert_eq!(jobs[0].status, "completed");
    assert_eq!(
        jobs[0].error_message.as_deref(),
        Some("4 items failed to generate")
    );
}

#[tokio::test]
async fn test_auto_approve_skips_draft() {
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);
    mount_anthropic_ok(&anthropic, "LinkedIn copy.").await;
    mount_embeddings_ok(&openai).await;

    let harness = setup(&anthropic, &openai, &grok).await;
    let params = GenerateWeekParams {
        platforms: Some(vec![Platform::LinkedIn]),
        auto_approve: true,
        ..week_params("2026-03-02")
    };
    let outcome = harness
        .state
        .generator
        .generate_week(harness.user_id, &params)
        .await
        .unwrap();

    assert_eq!(outcome.items_generated, 2);
    assert!(outcome.items.iter().all(|i| i.status == "approved"));
}

#[tokio::test]
async fn test_rerun_duplicates_rows() {
    // There is no idempotency guard: the same week generates twice.
    let (anthropic, openai, grok) =
        (MockServer::start().await, MockServer::start().await, MockServer::start().await);
    mount_anthropic_ok(&anthropic, "LinkedIn copy.").await;
    mount_embeddings_ok(&openai).await;

    let harness = setup(&anthropic, &openai, &grok).await;
    let params = GenerateWeekParams {
        platforms: Some(vec![Platform::LinkedIn]),
        ..week_params("2026-03-02")
    };

    harness
        .state
        .generator
        .generate_week(harness.user_id, &params)
        .await
        .unwrap();
    harness
        .state
        .generator
        .generate_week(harness.user_id, &params)
        .await
        .unwrap();

    let items = list_content(
        harness.state.db.pool(),
        harness.user_id,
        &ContentFilter {
            limit: 100,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(items.len(), 4);
}
