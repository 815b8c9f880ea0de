use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::summarizer::summarize_content;
use crate::ai::{truncate_chars, AnthropicClient};
use crate::config::Config;
use crate::db::{self, Database};

/// Stored raw content is capped at this many characters.
const RAW_CONTENT_CAP: usize = 50_000;

#[derive(Debug, Deserialize)]
struct ReaderResponse {
    data: Option<ReaderData>,
}

#[derive(Debug, Deserialize)]
struct ReaderData {
    content: Option<String>,
    title: Option<String>,
}

/// A page fetched through the Jina Reader proxy.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub content: String,
    pub title: String,
    pub word_count: usize,
}

/// Result of one scrape-and-store run.
#[derive(Debug, Clone)]
pub struct ScrapeRecord {
    pub id: i64,
    pub summary: Option<String>,
    pub is_new: bool,
}

/// Aggregate result of scraping every active URL.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatchOutcome {
    pub scraped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Scrapes research URLs through the Jina Reader proxy and stores
/// summarized snippets.
#[derive(Debug, Clone)]
pub struct ResearchScraper {
    http: Client,
    db: Database,
    reader_url: String,
    api_key: Option<String>,
    summarizer: AnthropicClient,
}

impl ResearchScraper {
    #[must_use]
    pub fn new(config: &Config, db: Database, summarizer: AnthropicClient) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            db,
            reader_url: config.jina_reader_url.clone(),
            api_key: config.jina_api_key.clone(),
            summarizer,
        }
    }

    /// Fetch one URL through the reader proxy.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or an unparseable response.
    pub async fn scrape_url(&self, url: &str) -> Result<ScrapedPage> {
        let mut request = self
            .http
            .get(format!("{}/{url}", self.reader_url))
            .header("Accept", "application/json")
            .header("X-Return-Format", "markdown");

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to scrape {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to scrape {url}: {status}");
        }

        let body: ReaderResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid JSON response from {url}"))?;

        let data = body.data.unwrap_or(ReaderData {
            content: None,
            title: None,
        });
        let content = data.content.unwrap_or_default();
        let word_count = content.split_whitespace().count();

        Ok(ScrapedPage {
            title: data.title.unwrap_or_else(|| url.to_string()),
            content,
            word_count,
        })
    }

    /// Scrape a configured research URL and append the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unknown (or foreign), the scrape
    /// fails, or the content cannot be stored. Summarization failures are
    /// not fatal; a placeholder summary is stored instead.
    pub async fn scrape_and_store(&self, url_id: i64, user_id: i64) -> Result<ScrapeRecord> {
        let pool = self.db.pool();

        let url_config = db::get_research_url(pool, url_id, user_id)
            .await?
            .with_context(|| format!("URL not found: {url_id}"))?;

        let scraped = self.scrape_url(&url_config.url).await?;

        if scraped.content.is_empty() {
            anyhow::bail!("No content extracted from {}", url_config.url);
        }

        let existing = db::latest_research_content_for_url(pool, url_id).await?;

        let summary = match summarize_content(&self.summarizer, &scraped.content, &url_config.category)
            .await
        {
            Ok(result) => result.text,
            Err(e) => {
                // Summarization failed; store without a real summary.
                debug!(url = %url_config.url, "Summarization failed: {e:#}");
                format!(
                    "Scraped {} words from {}",
                    scraped.word_count, url_config.title
                )
            }
        };

        let id = db::insert_research_content(
            pool,
            url_id,
            truncate_chars(&scraped.content, RAW_CONTENT_CAP),
            Some(&summary),
        )
        .await?;

        db::touch_research_url_scraped(pool, url_id).await?;

        Ok(ScrapeRecord {
            id,
            summary: Some(summary),
            is_new: existing.is_none(),
        })
    }

    /// Scrape every active URL for a user, sequentially. Per-URL failures
    /// are collected; the batch itself never fails.
    pub async fn scrape_all_active(&self, user_id: i64) -> Result<ScrapeBatchOutcome> {
        let urls = db::list_active_research_urls(self.db.pool(), user_id).await?;

        let mut outcome = ScrapeBatchOutcome::default();

        for url in urls {
            match self.scrape_and_store(url.id, user_id).await {
                Ok(_) => outcome.scraped += 1,
                Err(e) => {
                    warn!(url = %url.url, "Scrape failed: {e:#}");
                    outcome.failed += 1;
                    outcome.errors.push(format!("{}: {e:#}", url.title));
                }
            }
        }

        Ok(outcome)
    }
}
