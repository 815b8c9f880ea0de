mod context;
mod scraper;
mod summarizer;

pub use context::build_research_context;
pub use scraper::{ResearchScraper, ScrapeBatchOutcome, ScrapeRecord, ScrapedPage};
pub use summarizer::{summarize_content, KeyPoint, ResearchSummary};
