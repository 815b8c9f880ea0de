use anyhow::{Context, Result};
use sqlx::{QueryBuilder, SqlitePool};

use super::models::{
    ContentFilter, ContentItem, ContentUpdate, GenerationJob, JobStatus, NewContentItem,
    NewResearchUrl, ResearchContent, ResearchContextRow, ResearchUrl, ResearchUrlUpdate, Session,
    SettingsUpdate, StoredEmbedding, User, UserSettings,
};

// ========== Users ==========

/// Insert a new user, returning its ID.
pub async fn create_user(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await
        .context("Failed to insert user")?;

    Ok(result.last_insert_rowid())
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by id")
}

// ========== Sessions ==========

pub async fn create_session(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: &str,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(token)
            .bind(expires_at)
            .execute(pool)
            .await
            .context("Failed to insert session")?;

    Ok(result.last_insert_rowid())
}

pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session by token")
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;
    Ok(())
}

/// Delete all expired sessions, returning how many were removed.
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < datetime('now')")
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;
    Ok(result.rows_affected())
}

// ========== Content ==========

/// Insert a new content item, returning the stored row.
pub async fn insert_content(pool: &SqlitePool, item: &NewContentItem) -> Result<ContentItem> {
    let result = sqlx::query(
        r"
        INSERT INTO content
            (user_id, platform, content_type, topic, generated_text,
             publish_date, publish_time, status, owner)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(item.user_id)
    .bind(item.platform.as_str())
    .bind(item.content_type.as_str())
    .bind(&item.topic)
    .bind(&item.generated_text)
    .bind(&item.publish_date)
    .bind(&item.publish_time)
    .bind(item.status.as_str())
    .bind(&item.owner)
    .execute(pool)
    .await
    .context("Failed to insert content item")?;

    let id = result.last_insert_rowid();
    get_content_unscoped(pool, id)
        .await?
        .context("Inserted content item not found")
}

async fn get_content_unscoped(pool: &SqlitePool, id: i64) -> Result<Option<ContentItem>> {
    sqlx::query_as("SELECT * FROM content WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch content item")
}

/// Get a content item owned by the given user.
pub async fn get_content(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Option<ContentItem>> {
    sqlx::query_as("SELECT * FROM content WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch content item")
}

/// List a user's content items with optional status/platform/date filters,
/// ordered by publish date.
pub async fn list_content(
    pool: &SqlitePool,
    user_id: i64,
    filter: &ContentFilter,
) -> Result<Vec<ContentItem>> {
    let mut qb = QueryBuilder::new("SELECT * FROM content WHERE user_id = ");
    qb.push_bind(user_id);

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(platform) = filter.platform {
        qb.push(" AND platform = ").push_bind(platform.as_str());
    }
    if let Some(start) = &filter.start_date {
        qb.push(" AND publish_date >= ").push_bind(start);
    }
    if let Some(end) = &filter.end_date {
        qb.push(" AND publish_date <= ").push_bind(end);
    }

    qb.push(" ORDER BY publish_date ASC, publish_time ASC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as()
        .fetch_all(pool)
        .await
        .context("Failed to list content items")
}

/// Apply a partial update to a content item owned by the given user.
/// Returns the updated row, or `None` when no owned row matched.
pub async fn update_content(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    update: &ContentUpdate,
) -> Result<Option<ContentItem>> {
    if update.is_empty() {
        return get_content(pool, id, user_id).await;
    }

    let mut qb = QueryBuilder::new("UPDATE content SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(platform) = update.platform {
            sets.push("platform = ").push_bind_unseparated(platform.as_str());
        }
        if let Some(content_type) = update.content_type {
            sets.push("content_type = ")
                .push_bind_unseparated(content_type.as_str());
        }
        if let Some(topic) = &update.topic {
            sets.push("topic = ").push_bind_unseparated(topic);
        }
        if let Some(text) = &update.generated_text {
            sets.push("generated_text = ").push_bind_unseparated(text);
        }
        if let Some(date) = &update.publish_date {
            sets.push("publish_date = ").push_bind_unseparated(date);
        }
        if let Some(time) = &update.publish_time {
            sets.push("publish_time = ").push_bind_unseparated(time);
        }
        if let Some(status) = update.status {
            sets.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(owner) = &update.owner {
            sets.push("owner = ").push_bind_unseparated(owner);
        }
        sets.push("updated_at = datetime('now')");
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" AND user_id = ")
        .push_bind(user_id);

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Failed to update content item")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_content(pool, id, user_id).await
}

/// Delete a content item owned by the given user. Returns whether a row
/// was removed.
pub async fn delete_content(pool: &SqlitePool, id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete content item")?;

    Ok(result.rows_affected() > 0)
}

/// Conditionally transition a draft to approved. Returns the updated row,
/// or `None` when the item is missing, foreign, or not in draft status.
pub async fn approve_draft(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<ContentItem>> {
    let result = sqlx::query(
        r"
        UPDATE content
        SET status = 'approved', updated_at = datetime('now')
        WHERE id = ? AND user_id = ? AND status = 'draft'
        ",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to approve content item")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_content(pool, id, user_id).await
}

/// Record a created calendar event and flip the item to scheduled.
pub async fn mark_content_scheduled(
    pool: &SqlitePool,
    id: i64,
    calendar_event_id: &str,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE content
        SET status = 'scheduled', calendar_event_id = ?, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(calendar_event_id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to mark content scheduled")?;

    Ok(())
}

// ========== Content Embeddings ==========

/// Store an embedding vector (JSON array text) for a content item.
pub async fn insert_embedding(
    pool: &SqlitePool,
    content_id: i64,
    user_id: i64,
    vector_json: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO content_embeddings (content_id, user_id, vector)
        VALUES (?, ?, ?)
        ON CONFLICT(content_id) DO UPDATE SET vector = excluded.vector
        ",
    )
    .bind(content_id)
    .bind(user_id)
    .bind(vector_json)
    .execute(pool)
    .await
    .context("Failed to insert content embedding")?;

    Ok(())
}

/// All stored embeddings for a user, joined with each item's topic.
pub async fn list_embeddings(pool: &SqlitePool, user_id: i64) -> Result<Vec<StoredEmbedding>> {
    sqlx::query_as(
        r"
        SELECT e.content_id, c.topic, e.vector
        FROM content_embeddings e
        JOIN content c ON c.id = e.content_id
        WHERE e.user_id = ?
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list content embeddings")
}

// ========== Research URLs ==========

pub async fn insert_research_url(pool: &SqlitePool, url: &NewResearchUrl) -> Result<ResearchUrl> {
    let result = sqlx::query(
        r"
        INSERT INTO research_urls (user_id, url, title, category, scrape_frequency)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(url.user_id)
    .bind(&url.url)
    .bind(&url.title)
    .bind(url.category.as_str())
    .bind(url.scrape_frequency.as_str())
    .execute(pool)
    .await
    .context("Failed to insert research URL")?;

    let id = result.last_insert_rowid();
    get_research_url(pool, id, url.user_id)
        .await?
        .context("Inserted research URL not found")
}

pub async fn get_research_url(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<ResearchUrl>> {
    sqlx::query_as("SELECT * FROM research_urls WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch research URL")
}

pub async fn list_research_urls(pool: &SqlitePool, user_id: i64) -> Result<Vec<ResearchUrl>> {
    sqlx::query_as("SELECT * FROM research_urls WHERE user_id = ? ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list research URLs")
}

pub async fn list_active_research_urls(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ResearchUrl>> {
    sqlx::query_as(
        "SELECT * FROM research_urls WHERE user_id = ? AND is_active = 1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list active research URLs")
}

/// Apply a partial update to a research URL owned by the given user.
pub async fn update_research_url(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    update: &ResearchUrlUpdate,
) -> Result<Option<ResearchUrl>> {
    if update.is_empty() {
        return get_research_url(pool, id, user_id).await;
    }

    let mut qb = QueryBuilder::new("UPDATE research_urls SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(url) = &update.url {
            sets.push("url = ").push_bind_unseparated(url);
        }
        if let Some(title) = &update.title {
            sets.push("title = ").push_bind_unseparated(title);
        }
        if let Some(category) = update.category {
            sets.push("category = ").push_bind_unseparated(category.as_str());
        }
        if let Some(frequency) = update.scrape_frequency {
            sets.push("scrape_frequency = ")
                .push_bind_unseparated(frequency.as_str());
        }
        if let Some(active) = update.is_active {
            sets.push("is_active = ").push_bind_unseparated(active);
        }
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" AND user_id = ")
        .push_bind(user_id);

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Failed to update research URL")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_research_url(pool, id, user_id).await
}

pub async fn delete_research_url(pool: &SqlitePool, id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM research_urls WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete research URL")?;

    Ok(result.rows_affected() > 0)
}

pub async fn touch_research_url_scraped(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE research_urls SET last_scraped = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update last_scraped")?;
    Ok(())
}

// ========== Research Content ==========

/// Append a scrape attempt's content. Rows are never updated.
pub async fn insert_research_content(
    pool: &SqlitePool,
    research_url_id: i64,
    raw_content: &str,
    summary: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO research_content (research_url_id, raw_content, summary) VALUES (?, ?, ?)",
    )
    .bind(research_url_id)
    .bind(raw_content)
    .bind(summary)
    .execute(pool)
    .await
    .context("Failed to insert research content")?;

    Ok(result.last_insert_rowid())
}

/// The most recent scrape stored for a URL, if any.
pub async fn latest_research_content_for_url(
    pool: &SqlitePool,
    research_url_id: i64,
) -> Result<Option<ResearchContent>> {
    sqlx::query_as(
        r"
        SELECT * FROM research_content
        WHERE research_url_id = ?
        ORDER BY scraped_at DESC
        LIMIT 1
        ",
    )
    .bind(research_url_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch latest research content")
}

/// Recent research snippets for a user, newest first, joined with source
/// URL metadata. `since` is an RFC3339-style cutoff on scraped_at.
pub async fn recent_research_content(
    pool: &SqlitePool,
    user_id: i64,
    since: &str,
    limit: i64,
) -> Result<Vec<ResearchContextRow>> {
    sqlx::query_as(
        r"
        SELECT rc.id, rc.summary, rc.scraped_at, ru.category, ru.title, ru.url
        FROM research_content rc
        JOIN research_urls ru ON ru.id = rc.research_url_id
        WHERE ru.user_id = ? AND rc.scraped_at >= ?
        ORDER BY rc.scraped_at DESC
        LIMIT ?
        ",
    )
    .bind(user_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent research content")
}

// ========== Generation Jobs ==========

/// Insert a job row with status `running`, returning its ID.
pub async fn create_generation_job(
    pool: &SqlitePool,
    user_id: i64,
    week_start_date: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO generation_jobs (user_id, status, week_start_date) VALUES (?, 'running', ?)",
    )
    .bind(user_id)
    .bind(week_start_date)
    .execute(pool)
    .await
    .context("Failed to create generation job")?;

    Ok(result.last_insert_rowid())
}

/// Record a job's terminal status and aggregate counts.
pub async fn finish_generation_job(
    pool: &SqlitePool,
    id: i64,
    status: JobStatus,
    items_generated: i64,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE generation_jobs
        SET status = ?, items_generated = ?, error_message = ?, completed_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(status.as_str())
    .bind(items_generated)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to finish generation job")?;

    Ok(())
}

pub async fn get_generation_job(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<GenerationJob>> {
    sqlx::query_as("SELECT * FROM generation_jobs WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch generation job")
}

pub async fn list_generation_jobs(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<GenerationJob>> {
    sqlx::query_as(
        "SELECT * FROM generation_jobs WHERE user_id = ? ORDER BY started_at DESC, id DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list generation jobs")
}

/// Whether a job already exists for the given user and week start date.
/// Used by the scheduler to avoid double-triggering a week.
pub async fn generation_job_exists_for_week(
    pool: &SqlitePool,
    user_id: i64,
    week_start_date: &str,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM generation_jobs WHERE user_id = ? AND week_start_date = ?",
    )
    .bind(user_id)
    .bind(week_start_date)
    .fetch_one(pool)
    .await
    .context("Failed to count generation jobs for week")?;

    Ok(count > 0)
}

// ========== User Settings ==========

pub async fn get_user_settings(pool: &SqlitePool, user_id: i64) -> Result<Option<UserSettings>> {
    sqlx::query_as("SELECT * FROM user_settings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user settings")
}

/// Upsert the per-user settings singleton, applying only the provided
/// fields on conflict.
pub async fn upsert_user_settings(
    pool: &SqlitePool,
    user_id: i64,
    update: &SettingsUpdate,
) -> Result<()> {
    // The insert branch needs concrete defaults while the update branch
    // must leave omitted fields alone, so each value is bound twice.
    sqlx::query(
        r"
        INSERT INTO user_settings
            (user_id, weekly_generation_day, weekly_generation_time,
             auto_approve_enabled, notification_email)
        VALUES (?, COALESCE(?, 0), COALESCE(?, '18:00'), COALESCE(?, 0), ?)
        ON CONFLICT(user_id) DO UPDATE SET
            weekly_generation_day = COALESCE(?, weekly_generation_day),
            weekly_generation_time = COALESCE(?, weekly_generation_time),
            auto_approve_enabled = COALESCE(?, auto_approve_enabled),
            notification_email = COALESCE(?, notification_email)
        ",
    )
    .bind(user_id)
    .bind(update.weekly_generation_day)
    .bind(&update.weekly_generation_time)
    .bind(update.auto_approve_enabled)
    .bind(&update.notification_email)
    .bind(update.weekly_generation_day)
    .bind(&update.weekly_generation_time)
    .bind(update.auto_approve_enabled)
    .bind(&update.notification_email)
    .execute(pool)
    .await
    .context("Failed to upsert user settings")?;

    Ok(())
}

/// Store a Google OAuth refresh token, creating the settings row if needed.
pub async fn set_google_refresh_token(
    pool: &SqlitePool,
    user_id: i64,
    refresh_token: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO user_settings (user_id, google_refresh_token)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET google_refresh_token = excluded.google_refresh_token
        ",
    )
    .bind(user_id)
    .bind(refresh_token)
    .execute(pool)
    .await
    .context("Failed to store Google refresh token")?;

    Ok(())
}

pub async fn get_google_refresh_token(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<String>> {
    let token: Option<Option<String>> = sqlx::query_scalar(
        "SELECT google_refresh_token FROM user_settings WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch Google refresh token")?;

    Ok(token.flatten())
}

/// Settings for all users whose configured generation day matches.
pub async fn list_settings_for_day(pool: &SqlitePool, day: i64) -> Result<Vec<UserSettings>> {
    sqlx::query_as("SELECT * FROM user_settings WHERE weekly_generation_day = ?")
        .bind(day)
        .fetch_all(pool)
        .await
        .context("Failed to list settings for generation day")
}

// ========== Phrase Patterns ==========

pub async fn list_forbidden_phrases(pool: &SqlitePool, user_id: i64) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT phrase FROM phrase_patterns WHERE user_id = ? AND is_forbidden = 1 ORDER BY id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list forbidden phrases")
}

/// Replace the user's forbidden-phrase set with the given list.
pub async fn replace_forbidden_phrases(
    pool: &SqlitePool,
    user_id: i64,
    phrases: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM phrase_patterns WHERE user_id = ? AND is_forbidden = 1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to clear forbidden phrases")?;

    for phrase in phrases {
        sqlx::query("INSERT INTO phrase_patterns (user_id, phrase, is_forbidden) VALUES (?, ?, 1)")
            .bind(user_id)
            .bind(phrase)
            .execute(pool)
            .await
            .context("Failed to insert forbidden phrase")?;
    }

    Ok(())
}
