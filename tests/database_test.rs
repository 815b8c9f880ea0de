//! Integration tests for database operations.

use content_calendar::db::{
    approve_draft, create_user, delete_content, get_content, get_google_refresh_token,
    insert_content, insert_embedding, list_content, list_embeddings, list_forbidden_phrases,
    replace_forbidden_phrases, set_google_refresh_token, update_content, upsert_user_settings,
    ContentFilter, ContentStatus, ContentType, ContentUpdate, Database, NewContentItem, Platform,
    SettingsUpdate,
};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

async fn create_test_user(db: &Database, email: &str) -> i64 {
    create_user(db.pool(), email, "not-a-real-hash")
        .await
        .expect("Failed to create user")
}

fn sample_item(user_id: i64) -> NewContentItem {
    NewContentItem {
        user_id,
        platform: Platform::LinkedIn,
        content_type: ContentType::Market,
        topic: "Utah housing market update and trends".to_string(),
        generated_text: "The market is moving.".to_string(),
        publish_date: "2026-03-02".to_string(),
        publish_time: "10:00 AM".to_string(),
        status: ContentStatus::Draft,
        owner: "Liz Sears".to_string(),
    }
}

#[tokio::test]
async fn test_insert_and_get_content() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    let item = insert_content(db.pool(), &sample_item(user_id))
        .await
        .expect("Failed to insert content");
    assert!(item.id > 0);
    assert_eq!(item.status, "draft");
    assert_eq!(item.platform, "LinkedIn");

    let fetched = get_content(db.pool(), item.id, user_id)
        .await
        .expect("Failed to get content")
        .expect("Content not found");
    assert_eq!(fetched.topic, "Utah housing market update and trends");
    assert_eq!(fetched.publish_time, "10:00 AM");
}

#[tokio::test]
async fn test_content_is_owner_scoped() {
    let (db, _temp_dir) = setup_db().await;
    let owner = create_test_user(&db, "liz@example.com").await;
    let other = create_test_user(&db, "intruder@example.com").await;

    let item = insert_content(db.pool(), &sample_item(owner)).await.unwrap();

    // Reads, updates and deletes with the wrong user find nothing.
    assert!(get_content(db.pool(), item.id, other).await.unwrap().is_none());

    let update = ContentUpdate {
        topic: Some("Hijacked".to_string()),
        ..Default::default()
    };
    assert!(update_content(db.pool(), item.id, other, &update)
        .await
        .unwrap()
        .is_none());
    assert!(!delete_content(db.pool(), item.id, other).await.unwrap());

    // The row is untouched for its owner.
    let fetched = get_content(db.pool(), item.id, owner).await.unwrap().unwrap();
    assert_eq!(fetched.topic, "Utah housing market update and trends");
}

#[tokio::test]
async fn test_approve_only_from_draft() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    let item = insert_content(db.pool(), &sample_item(user_id)).await.unwrap();

    // draft -> approved works once
    let approved = approve_draft(db.pool(), item.id, user_id)
        .await
        .unwrap()
        .expect("Approve should succeed from draft");
    assert_eq!(approved.status, "approved");

    // approving again fails the precondition and never mutates status
    assert!(approve_draft(db.pool(), item.id, user_id).await.unwrap().is_none());
    let fetched = get_content(db.pool(), item.id, user_id).await.unwrap().unwrap();
    assert_eq!(fetched.status, "approved");
}

#[tokio::test]
async fn test_approve_is_owner_scoped() {
    let (db, _temp_dir) = setup_db().await;
    let owner = create_test_user(&db, "liz@example.com").await;
    let other = create_test_user(&db, "intruder@example.com").await;

    let item = insert_content(db.pool(), &sample_item(owner)).await.unwrap();

    assert!(approve_draft(db.pool(), item.id, other).await.unwrap().is_none());

    let fetched = get_content(db.pool(), item.id, owner).await.unwrap().unwrap();
    assert_eq!(fetched.status, "draft");
}

#[tokio::test]
async fn test_list_content_filters() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    insert_content(db.pool(), &sample_item(user_id)).await.unwrap();

    let mut blog = sample_item(user_id);
    blog.platform = Platform::Blog;
    blog.publish_date = "2026-03-03".to_string();
    blog.status = ContentStatus::Approved;
    insert_content(db.pool(), &blog).await.unwrap();

    let filter = ContentFilter {
        platform: Some(Platform::Blog),
        limit: 50,
        ..Default::default()
    };
    let items = list_content(db.pool(), user_id, &filter).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].platform, "Blog");

    let filter = ContentFilter {
        status: Some(ContentStatus::Draft),
        limit: 50,
        ..Default::default()
    };
    let items = list_content(db.pool(), user_id, &filter).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, "draft");

    // Date range covering only the second item
    let filter = ContentFilter {
        start_date: Some("2026-03-03".to_string()),
        end_date: Some("2026-03-09".to_string()),
        limit: 50,
        ..Default::default()
    };
    let items = list_content(db.pool(), user_id, &filter).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].publish_date, "2026-03-03");
}

#[tokio::test]
async fn test_partial_update() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    let item = insert_content(db.pool(), &sample_item(user_id)).await.unwrap();

    let update = ContentUpdate {
        generated_text: Some("Rewritten copy.".to_string()),
        status: Some(ContentStatus::Published),
        ..Default::default()
    };
    let updated = update_content(db.pool(), item.id, user_id, &update)
        .await
        .unwrap()
        .expect("Update should find the row");

    assert_eq!(updated.generated_text, "Rewritten copy.");
    assert_eq!(updated.status, "published");
    // Untouched fields survive
    assert_eq!(updated.topic, item.topic);
    assert_eq!(updated.publish_time, item.publish_time);
}

#[tokio::test]
async fn test_settings_upsert_and_phrases() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    upsert_user_settings(
        db.pool(),
        user_id,
        &SettingsUpdate {
            weekly_generation_day: Some(3),
            auto_approve_enabled: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Partial upsert keeps earlier values
    upsert_user_settings(
        db.pool(),
        user_id,
        &SettingsUpdate {
            weekly_generation_time: Some("07:30".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let settings = content_calendar::db::get_user_settings(db.pool(), user_id)
        .await
        .unwrap()
        .expect("Settings row should exist");
    assert_eq!(settings.weekly_generation_day, 3);
    assert_eq!(settings.weekly_generation_time, "07:30");
    assert!(settings.auto_approve_enabled);

    // Phrase replacement is a full swap
    replace_forbidden_phrases(db.pool(), user_id, &["synergy".to_string()])
        .await
        .unwrap();
    replace_forbidden_phrases(
        db.pool(),
        user_id,
        &["leverage".to_string(), "disrupt".to_string()],
    )
    .await
    .unwrap();

    let phrases = list_forbidden_phrases(db.pool(), user_id).await.unwrap();
    assert_eq!(phrases, vec!["leverage".to_string(), "disrupt".to_string()]);
}

#[tokio::test]
async fn test_refresh_token_upsert() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    assert!(get_google_refresh_token(db.pool(), user_id).await.unwrap().is_none());

    set_google_refresh_token(db.pool(), user_id, "refresh-1").await.unwrap();
    assert_eq!(
        get_google_refresh_token(db.pool(), user_id).await.unwrap().as_deref(),
        Some("refresh-1")
    );

    // Reconnecting replaces the token without clobbering other settings
    upsert_user_settings(
        db.pool(),
        user_id,
        &SettingsUpdate {
            weekly_generation_day: Some(5),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    set_google_refresh_token(db.pool(), user_id, "refresh-2").await.unwrap();

    let settings = content_calendar::db::get_user_settings(db.pool(), user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settings.google_refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(settings.weekly_generation_day, 5);
}

#[tokio::test]
async fn test_embeddings_roundtrip() {
    let (db, _temp_dir) = setup_db().await;
    let user_id = create_test_user(&db, "liz@example.com").await;

    let item = insert_content(db.pool(), &sample_item(user_id)).await.unwrap();

    insert_embedding(db.pool(), item.id, user_id, "[1.0,0.0,0.0]")
        .await
        .unwrap();

    let stored = list_embeddings(db.pool(), user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content_id, item.id);
    assert_eq!(stored[0].topic, item.topic);

    let vector: Vec<f32> = serde_json::from_str(&stored[0].vector).unwrap();
    assert_eq!(vector, vec![1.0, 0.0, 0.0]);

    // Embeddings are user-scoped
    let other = create_test_user(&db, "other@example.com").await;
    assert!(list_embeddings(db.pool(), other).await.unwrap().is_empty());
}
