mod anthropic;
mod grok;
mod openai;

pub use anthropic::AnthropicClient;
pub use grok::GrokClient;
pub use openai::OpenAiClient;

use std::time::Duration;

use thiserror::Error;

use crate::config::Config;
use crate::db::{ContentType, Platform};

/// Errors from the AI text-generation providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} API key is not configured")]
    MissingKey(&'static str),
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("{provider} returned an empty response")]
    Empty { provider: &'static str },
    #[error("request to {provider} failed")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// One content-generation request: a (platform, topic, content-type) tuple
/// plus the prompt context.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub platform: Platform,
    pub topic: &'a str,
    pub content_type: ContentType,
    pub research_context: &'a str,
    pub forbidden_phrases: &'a [String],
}

/// Dispatches generation requests to the provider responsible for each
/// platform: LinkedIn and Blog go to Anthropic, IGFB and YouTube to
/// OpenAI, X to Grok.
#[derive(Debug, Clone)]
pub struct AiRouter {
    anthropic: AnthropicClient,
    openai: OpenAiClient,
    grok: GrokClient,
}

impl AiRouter {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            anthropic: AnthropicClient::new(config, http.clone()),
            openai: OpenAiClient::new(config, http.clone()),
            grok: GrokClient::new(config, http),
        }
    }

    /// Generate text for one content slot. A single blocking request per
    /// slot; provider errors propagate to the caller.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        match request.platform {
            Platform::LinkedIn | Platform::Blog => self.anthropic.generate(request).await,
            Platform::Igfb | Platform::YouTube => self.openai.generate(request).await,
            Platform::X => self.grok.generate(request).await,
        }
    }

    /// The Anthropic client, shared with the research summarizer.
    #[must_use]
    pub const fn anthropic(&self) -> &AnthropicClient {
        &self.anthropic
    }

    /// The OpenAI client, shared with the similarity gate for embeddings.
    #[must_use]
    pub const fn openai(&self) -> &OpenAiClient {
        &self.openai
    }
}

/// Truncate a string to at most `max` characters on a char boundary.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 5), "");
        // Multi-byte characters are not split
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
