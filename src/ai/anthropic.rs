use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationRequest, ProviderError};
use crate::config::Config;
use crate::db::Platform;

const ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Phrases that are always banned from generated copy, regardless of the
/// user's own forbidden list.
const BANNED_PHRASES: &[&str] = &[
    "cutting-edge",
    "revolutionary",
    "groundbreaking",
    "game changer",
    "paradigm shift",
    "unprecedented",
    "transformative",
    "visionary",
];

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Client for the Anthropic Messages API. Handles LinkedIn and Blog
/// generation, and research summarization.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicClient {
    #[must_use]
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            api_key: config.anthropic_api_key.clone(),
            base_url: config.anthropic_base_url.clone(),
        }
    }

    /// Generate LinkedIn or Blog copy for a content slot.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        let system = build_system_prompt(request.platform, request.forbidden_phrases);
        let user = build_user_prompt(request);

        let content = self
            .complete(Some(&system), &user, 4096, Some(0.85))
            .await?;

        // Safety: remove rogue em dashes
        Ok(content.replace('\u{2014}', ","))
    }

    /// Send one message exchange and return the first text block.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey("ANTHROPIC"))?;

        let request = MessagesRequest {
            model: ANTHROPIC_MODEL,
            max_tokens,
            temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "Anthropic",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "Anthropic",
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Request {
                    provider: "Anthropic",
                    source,
                })?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(ProviderError::Empty {
                provider: "Anthropic",
            })
    }
}

fn build_system_prompt(platform: Platform, forbidden_phrases: &[String]) -> String {
    let mut all_forbidden: Vec<&str> = BANNED_PHRASES.to_vec();
    all_forbidden.extend(forbidden_phrases.iter().map(String::as_str));

    let length_guide = if platform == Platform::Blog {
        "Write 1000-1500 words with clear sections in prose."
    } else {
        "Write 200-300 words. Hook \u{2192} Insight \u{2192} CTA."
    };

    format!(
        "You are Liz Sears writing for Utah's Elite Realtors.\n\n\
         Voice characteristics:\n\
         - Natural, conversational tone (like talking to a friend over coffee)\n\
         - Mix paragraph lengths (one-liners, medium, longer paragraphs)\n\
         - Use contractions and run-on thoughts when natural\n\
         - Include emotional beats (excitement, relief, hope, gratitude)\n\
         - Break grammar rules when it feels right\n\
         - Use exclamation points when genuinely excited (aim for 2-3 per piece)\n\n\
         Hard rules:\n\
         - NEVER use em dash (\u{2014})\n\
         - NEVER use these phrases: {}\n\
         - NO markdown headings (#, ##, ###) or formatting (* _)\n\
         - NO bullet lists or numbered lists\n\n\
         {length_guide}",
        all_forbidden.join(", ")
    )
}

fn build_user_prompt(request: &GenerationRequest<'_>) -> String {
    let context_block = if request.research_context.is_empty() {
        String::new()
    } else {
        format!("{}\n\n---\n\n", request.research_context)
    };

    format!(
        "{context_block}Topic: {}\nType: {}\n\n\
         Write {} content using the research context above to inform your perspective.",
        request.topic,
        request.content_type.as_str(),
        request.platform.as_str()
    )
}
