//! Weekly content generation: a fixed schedule template, per-type topic
//! pools, and the sequential job runner.

pub mod scheduler;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{truncate_chars, AiRouter, GenerationRequest};
use crate::db::{
    self, ContentStatus, ContentType, Database, JobStatus, NewContentItem, Platform,
};
use crate::research::{build_research_context, ResearchScraper};
use crate::vectors::{self, EmbeddingQueue, EmbeddingTask};

/// Research context window and size used for generation prompts.
const CONTEXT_DAYS_BACK: i64 = 14;
const CONTEXT_MAX_ITEMS: i64 = 10;

/// Suffix appended to a topic the similarity gate flags as a duplicate.
const FRESH_PERSPECTIVE_SUFFIX: &str = " (fresh perspective)";

/// Default owner recorded on generated items.
const DEFAULT_OWNER: &str = "Liz Sears";

/// One (day-offset, platform, content-type) entry in the weekly template.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleSlot {
    pub day_offset: i64,
    pub platform: Platform,
    pub content_type: ContentType,
    pub publish_time: &'static str,
}

/// The fixed weekly schedule: which platforms publish on which days.
/// Day offsets are relative to the Monday the week starts on.
pub const WEEKLY_SCHEDULE: [ScheduleSlot; 12] = [
    // Monday
    ScheduleSlot { day_offset: 0, platform: Platform::Igfb, content_type: ContentType::Local, publish_time: "9:00 AM" },
    ScheduleSlot { day_offset: 0, platform: Platform::LinkedIn, content_type: ContentType::Market, publish_time: "10:00 AM" },
    // Tuesday
    ScheduleSlot { day_offset: 1, platform: Platform::Igfb, content_type: ContentType::Educational, publish_time: "9:00 AM" },
    ScheduleSlot { day_offset: 1, platform: Platform::Blog, content_type: ContentType::Educational, publish_time: "2:00 PM" },
    // Wednesday
    ScheduleSlot { day_offset: 2, platform: Platform::Igfb, content_type: ContentType::Personal, publish_time: "9:00 AM" },
    ScheduleSlot { day_offset: 2, platform: Platform::X, content_type: ContentType::Professional, publish_time: "10:00 AM" },
    // Thursday
    ScheduleSlot { day_offset: 3, platform: Platform::Igfb, content_type: ContentType::Market, publish_time: "9:00 AM" },
    ScheduleSlot { day_offset: 3, platform: Platform::YouTube, content_type: ContentType::Educational, publish_time: "3:00 PM" },
    // Friday
    ScheduleSlot { day_offset: 4, platform: Platform::Igfb, content_type: ContentType::Promotional, publish_time: "9:00 AM" },
    ScheduleSlot { day_offset: 4, platform: Platform::LinkedIn, content_type: ContentType::Insight, publish_time: "10:00 AM" },
    // Saturday
    ScheduleSlot { day_offset: 5, platform: Platform::Igfb, content_type: ContentType::Community, publish_time: "10:00 AM" },
    // Sunday
    ScheduleSlot { day_offset: 6, platform: Platform::Igfb, content_type: ContentType::Reflection, publish_time: "11:00 AM" },
];

/// Topic idea pool per content type.
fn topic_seeds(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Local => &[
            "Hidden gem restaurants in Salt Lake Valley",
            "Best hiking trails near Utah neighborhoods",
            "Local events this weekend in Utah County",
            "New businesses opening in the Wasatch Front",
            "Utah seasonal activities families love",
        ],
        ContentType::Market => &[
            "Utah housing market update and trends",
            "Interest rate impact on Utah buyers",
            "Salt Lake County vs Utah County market comparison",
            "First-time buyer opportunities in Utah",
            "Inventory trends in the Wasatch Front",
        ],
        ContentType::Educational => &[
            "Home inspection tips for Utah buyers",
            "Understanding Utah property taxes",
            "How to prepare your Utah home for winter",
            "Mortgage pre-approval process explained",
            "What to know about HOAs in Utah",
        ],
        ContentType::Personal => &[
            "Why I love being a Utah realtor",
            "A day in my life as a real estate agent",
            "Lessons learned from my recent closings",
            "My favorite Utah neighborhoods and why",
            "What clients teach me about homeownership",
        ],
        ContentType::Promotional => &[
            "New listing spotlight in the Salt Lake area",
            "Open house this weekend",
            "Just sold celebration",
            "Client testimonial and success story",
            "Why work with Utah's Elite Realtors",
        ],
        ContentType::Professional => &[
            "Negotiation strategies that work in Utah",
            "How I help sellers maximize their home value",
            "The importance of local market knowledge",
            "Behind the scenes of a real estate transaction",
            "Professional development in real estate",
        ],
        ContentType::Community => &[
            "Supporting local Utah charities and events",
            "Neighborhood spotlight and community features",
            "Utah school district updates for families",
            "Local business partnerships and recommendations",
            "Community safety tips and resources",
        ],
        ContentType::Reflection => &[
            "Grateful for another week helping Utah families",
            "Sunday thoughts on the meaning of home",
            "Looking back at this week's wins",
            "What home means to different people",
            "The journey of finding your perfect home",
        ],
        ContentType::Insight => &[
            "Real estate technology trends in 2026",
            "How remote work is changing Utah housing",
            "Sustainability in Utah real estate",
            "The future of homebuying in Utah",
            "Investment property insights for Utah",
        ],
        ContentType::Guide => &[
            "Step-by-step guide to buying in Utah",
            "Complete guide to selling your Utah home",
            "Moving to Utah: everything you need to know",
            "Utah relocation guide for remote workers",
            "First-time homebuyer roadmap",
        ],
        ContentType::Safety => &[
            "Home safety checklist for Utah seasons",
            "Wildfire preparedness for Utah homeowners",
            "Winter storm preparation for your home",
            "Home security tips for Utah families",
            "Earthquake readiness in the Wasatch Front",
        ],
    }
}

/// Pick a topic pseudo-randomly from the content type's seed pool.
fn pick_topic(content_type: ContentType) -> &'static str {
    let seeds = topic_seeds(content_type);
    seeds
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(seeds[0])
}

/// Add a day offset to a YYYY-MM-DD date string.
fn add_days(date: NaiveDate, days: i64) -> String {
    (date + Duration::days(days)).format("%Y-%m-%d").to_string()
}

/// Parameters for one weekly generation run.
#[derive(Debug, Clone)]
pub struct GenerateWeekParams {
    /// Week start date, YYYY-MM-DD (Monday).
    pub start_date: String,
    /// Restrict generation to these platforms; `None` means all.
    pub platforms: Option<Vec<Platform>>,
    /// Scrape active research URLs before generating.
    pub research_first: bool,
    /// Insert generated items as approved instead of draft.
    pub auto_approve: bool,
}

/// Summary of one generated content item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedItemSummary {
    pub id: i64,
    pub platform: String,
    pub topic: String,
    pub publish_date: String,
    pub status: String,
}

/// Terminal result of a weekly generation run.
#[derive(Debug, Clone)]
pub struct GenerateWeekOutcome {
    pub job_id: i64,
    pub status: JobStatus,
    pub items_generated: usize,
    pub items_failed: usize,
    pub items: Vec<GeneratedItemSummary>,
}

/// Runs weekly generation jobs: one sequential pass over the filtered
/// schedule template, persisting a `generation_jobs` row per run.
#[derive(Clone)]
pub struct WeeklyGenerator {
    db: Database,
    ai: Arc<AiRouter>,
    scraper: Arc<ResearchScraper>,
    embeddings: EmbeddingQueue,
}

impl WeeklyGenerator {
    #[must_use]
    pub fn new(
        db: Database,
        ai: Arc<AiRouter>,
        scraper: Arc<ResearchScraper>,
        embeddings: EmbeddingQueue,
    ) -> Self {
        Self {
            db,
            ai,
            scraper,
            embeddings,
        }
    }

    /// Run one weekly generation job for a user.
    ///
    /// Partial failure is normal: each slot failure is counted and the
    /// loop continues. The job only ends `failed` when every slot failed.
    /// Re-running the same week creates duplicate content rows; there is
    /// no idempotency guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the start date is invalid or the job row
    /// cannot be created or finalized.
    pub async fn generate_week(
        &self,
        user_id: i64,
        params: &GenerateWeekParams,
    ) -> Result<GenerateWeekOutcome> {
        let pool = self.db.pool();

        let start = NaiveDate::parse_from_str(&params.start_date, "%Y-%m-%d")
            .context("Invalid start date")?;

        let job_id = db::create_generation_job(pool, user_id, &params.start_date).await?;
        info!(job_id, user_id, week = %params.start_date, "Starting weekly generation");

        let forbidden_phrases = db::list_forbidden_phrases(pool, user_id)
            .await
            .unwrap_or_default();

        // Research scraping is non-critical
        if params.research_first {
            if let Err(e) = self.scraper.scrape_all_active(user_id).await {
                warn!("Pre-generation research scrape failed: {e:#}");
            }
        }

        let research_context =
            build_research_context(pool, user_id, CONTEXT_DAYS_BACK, CONTEXT_MAX_ITEMS)
                .await
                .unwrap_or_default();

        let schedule: Vec<&ScheduleSlot> = WEEKLY_SCHEDULE
            .iter()
            .filter(|slot| {
                params
                    .platforms
                    .as_ref()
                    .map_or(true, |platforms| platforms.contains(&slot.platform))
            })
            .collect();

        let mut items = Vec::new();
        let mut failed_count = 0usize;

        for slot in &schedule {
            match self
                .generate_slot(user_id, slot, start, &research_context, &forbidden_phrases, params)
                .await
            {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(
                        platform = slot.platform.as_str(),
                        day_offset = slot.day_offset,
                        "Slot generation failed: {e:#}"
                    );
                    failed_count += 1;
                }
            }
        }

        let status = if failed_count == schedule.len() {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        let error_message = if failed_count > 0 {
            Some(format!("{failed_count} items failed to generate"))
        } else {
            None
        };

        db::finish_generation_job(
            pool,
            job_id,
            status,
            items.len() as i64,
            error_message.as_deref(),
        )
        .await?;

        info!(
            job_id,
            generated = items.len(),
            failed = failed_count,
            status = status.as_str(),
            "Weekly generation finished"
        );

        Ok(GenerateWeekOutcome {
            job_id,
            status,
            items_generated: items.len(),
            items_failed: failed_count,
            items,
        })
    }

    /// Generate and persist one schedule slot.
    async fn generate_slot(
        &self,
        user_id: i64,
        slot: &ScheduleSlot,
        start: NaiveDate,
        research_context: &str,
        forbidden_phrases: &[String],
        params: &GenerateWeekParams,
    ) -> Result<GeneratedItemSummary> {
        let pool = self.db.pool();

        let publish_date = add_days(start, slot.day_offset);
        let topic = pick_topic(slot.content_type);

        // A similar topic gets a nudge toward a different angle, not a
        // rejection.
        let check =
            vectors::check_similarity(pool, self.ai.openai(), topic, "", user_id).await;
        let final_topic = if check.is_similar {
            format!("{topic}{FRESH_PERSPECTIVE_SUFFIX}")
        } else {
            topic.to_string()
        };

        let generated_text = self
            .ai
            .generate(&GenerationRequest {
                platform: slot.platform,
                topic: &final_topic,
                content_type: slot.content_type,
                research_context,
                forbidden_phrases,
            })
            .await?;

        let status = if params.auto_approve {
            ContentStatus::Approved
        } else {
            ContentStatus::Draft
        };

        let item = db::insert_content(
            pool,
            &NewContentItem {
                user_id,
                platform: slot.platform,
                content_type: slot.content_type,
                topic: final_topic.clone(),
                generated_text: generated_text.clone(),
                publish_date: publish_date.clone(),
                publish_time: slot.publish_time.to_string(),
                status,
                owner: DEFAULT_OWNER.to_string(),
            },
        )
        .await?;

        // Embedding storage happens off the request path; failures are
        // logged by the worker.
        self.embeddings.enqueue(EmbeddingTask {
            content_id: item.id,
            user_id,
            text: format!("{final_topic} {}", truncate_chars(&generated_text, 500)),
        });

        Ok(GeneratedItemSummary {
            id: item.id,
            platform: item.platform,
            topic: item.topic,
            publish_date: item.publish_date,
            status: item.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_has_twelve_slots() {
        assert_eq!(WEEKLY_SCHEDULE.len(), 12);
    }

    #[test]
    fn test_schedule_covers_every_day() {
        for offset in 0..7 {
            assert!(
                WEEKLY_SCHEDULE.iter().any(|s| s.day_offset == offset),
                "no slot for day offset {offset}"
            );
        }
    }

    #[test]
    fn test_schedule_linkedin_slot_count() {
        let count = WEEKLY_SCHEDULE
            .iter()
            .filter(|s| s.platform == Platform::LinkedIn)
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_every_content_type_has_seeds() {
        for content_type in [
            ContentType::Local,
            ContentType::Market,
            ContentType::Educational,
            ContentType::Personal,
            ContentType::Promotional,
            ContentType::Professional,
            ContentType::Community,
            ContentType::Reflection,
            ContentType::Insight,
            ContentType::Guide,
            ContentType::Safety,
        ] {
            assert!(!topic_seeds(content_type).is_empty());
        }
    }

    #[test]
    fn test_pick_topic_comes_from_pool() {
        let topic = pick_topic(ContentType::Market);
        assert!(topic_seeds(ContentType::Market).contains(&topic));
    }

    #[test]
    fn test_add_days() {
        let monday = NaiveDate::parse_from_str("2026-03-02", "%Y-%m-%d").unwrap();
        assert_eq!(add_days(monday, 0), "2026-03-02");
        assert_eq!(add_days(monday, 6), "2026-03-08");
    }
}
