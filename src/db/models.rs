use serde::{Deserialize, Serialize};

/// Publishing platform for a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "IGFB")]
    Igfb,
    LinkedIn,
    Blog,
    YouTube,
    X,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Igfb => "IGFB",
            Self::LinkedIn => "LinkedIn",
            Self::Blog => "Blog",
            Self::YouTube => "YouTube",
            Self::X => "X",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IGFB" => Some(Self::Igfb),
            "LinkedIn" => Some(Self::LinkedIn),
            "Blog" => Some(Self::Blog),
            "YouTube" => Some(Self::YouTube),
            "X" => Some(Self::X),
            _ => None,
        }
    }
}

/// Editorial category of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Local,
    Market,
    Educational,
    Personal,
    Promotional,
    Professional,
    Community,
    Reflection,
    Insight,
    Guide,
    Safety,
}

impl ContentType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Market => "Market",
            Self::Educational => "Educational",
            Self::Personal => "Personal",
            Self::Promotional => "Promotional",
            Self::Professional => "Professional",
            Self::Community => "Community",
            Self::Reflection => "Reflection",
            Self::Insight => "Insight",
            Self::Guide => "Guide",
            Self::Safety => "Safety",
        }
    }
}

/// Review status of a content item. Transitions are ad-hoc route calls,
/// not an enforced state machine; approve is the only conditional one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Approved,
    Scheduled,
    Published,
}

impl ContentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "scheduled" => Some(Self::Scheduled),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Category of a research source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlCategory {
    #[serde(rename = "Market Research")]
    MarketResearch,
    #[serde(rename = "Local News")]
    LocalNews,
    #[serde(rename = "Industry Trends")]
    IndustryTrends,
    #[serde(rename = "Competitor Analysis")]
    CompetitorAnalysis,
    General,
}

impl UrlCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketResearch => "Market Research",
            Self::LocalNews => "Local News",
            Self::IndustryTrends => "Industry Trends",
            Self::CompetitorAnalysis => "Competitor Analysis",
            Self::General => "General",
        }
    }
}

/// How often a research URL should be scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ScrapeFrequency {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Terminal-only status of a weekly generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// An account that owns content, research sources and settings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// An authenticated session, referenced by the cookie token.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
}

/// One scheduled social/blog post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentItem {
    pub id: i64,
    pub user_id: i64,
    pub platform: String,
    pub content_type: String,
    pub topic: String,
    pub generated_text: String,
    pub publish_date: String,
    pub publish_time: String,
    pub status: String,
    pub owner: String,
    pub calendar_event_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentItem {
    #[must_use]
    pub fn status_enum(&self) -> Option<ContentStatus> {
        ContentStatus::from_str(&self.status)
    }
}

/// Data for inserting a new content item.
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub user_id: i64,
    pub platform: Platform,
    pub content_type: ContentType,
    pub topic: String,
    pub generated_text: String,
    pub publish_date: String,
    pub publish_time: String,
    pub status: ContentStatus,
    pub owner: String,
}

/// Partial update for a content item; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ContentUpdate {
    pub platform: Option<Platform>,
    pub content_type: Option<ContentType>,
    pub topic: Option<String>,
    pub generated_text: Option<String>,
    pub publish_date: Option<String>,
    pub publish_time: Option<String>,
    pub status: Option<ContentStatus>,
    pub owner: Option<String>,
}

impl ContentUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platform.is_none()
            && self.content_type.is_none()
            && self.topic.is_none()
            && self.generated_text.is_none()
            && self.publish_date.is_none()
            && self.publish_time.is_none()
            && self.status.is_none()
            && self.owner.is_none()
    }
}

/// Filters for listing content items.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub status: Option<ContentStatus>,
    pub platform: Option<Platform>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// A research source URL to scrape for topic context.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchUrl {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub title: String,
    pub category: String,
    pub scrape_frequency: String,
    pub is_active: bool,
    pub last_scraped: Option<String>,
    pub created_at: String,
}

/// Data for inserting a new research URL.
#[derive(Debug, Clone)]
pub struct NewResearchUrl {
    pub user_id: i64,
    pub url: String,
    pub title: String,
    pub category: UrlCategory,
    pub scrape_frequency: ScrapeFrequency,
}

/// Partial update for a research URL.
#[derive(Debug, Clone, Default)]
pub struct ResearchUrlUpdate {
    pub url: Option<String>,
    pub title: Option<String>,
    pub category: Option<UrlCategory>,
    pub scrape_frequency: Option<ScrapeFrequency>,
    pub is_active: Option<bool>,
}

impl ResearchUrlUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.category.is_none()
            && self.scrape_frequency.is_none()
            && self.is_active.is_none()
    }
}

/// One scrape attempt's stored text and summary. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchContent {
    pub id: i64,
    pub research_url_id: i64,
    pub raw_content: String,
    pub summary: Option<String>,
    pub scraped_at: String,
}

/// A research snippet joined with its source URL metadata, for display
/// and for building the generation research context.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchContextRow {
    pub id: i64,
    pub summary: Option<String>,
    pub scraped_at: String,
    pub category: String,
    pub title: String,
    pub url: String,
}

/// One weekly-generation invocation. Append-only log, no retry linkage.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GenerationJob {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub week_start_date: String,
    pub items_generated: i64,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

/// Per-user settings singleton.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSettings {
    pub id: i64,
    pub user_id: i64,
    pub weekly_generation_day: i64,
    pub weekly_generation_time: String,
    pub auto_approve_enabled: bool,
    pub notification_email: Option<String>,
    pub google_refresh_token: Option<String>,
}

/// Partial update for user settings; `None` fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub weekly_generation_day: Option<i64>,
    pub weekly_generation_time: Option<String>,
    pub auto_approve_enabled: Option<bool>,
    pub notification_email: Option<String>,
}

/// A stored content embedding, joined with the item's topic for
/// similarity ranking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredEmbedding {
    pub content_id: i64,
    pub topic: String,
    pub vector: String,
}
