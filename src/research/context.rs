use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::db;

/// Build the research-context text blob injected into generation prompts:
/// recent scrape summaries, newest first, under a markdown header. Returns
/// an empty string when nothing qualifies.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn build_research_context(
    pool: &SqlitePool,
    user_id: i64,
    days_back: i64,
    max_items: i64,
) -> Result<String> {
    let since = (Utc::now() - Duration::days(days_back))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let research = db::recent_research_content(pool, user_id, &since, max_items).await?;

    if research.is_empty() {
        return Ok(String::new());
    }

    let mut context = String::from("## Recent Research Context\n\n");
    context.push_str(
        "The following insights were gathered from recent research. Use them to inform your content:\n\n",
    );

    for item in research {
        context.push_str(&format!("### {}: {}\n", item.category, item.title));
        context.push_str(&format!("Source: {}\n", item.url));
        context.push_str(item.summary.as_deref().unwrap_or("No summary available."));
        context.push_str("\n\n");
    }

    Ok(context)
}
