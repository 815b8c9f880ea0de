use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{truncate_chars, GenerationRequest, ProviderError};
use crate::config::Config;
use crate::db::Platform;

const CHAT_MODEL: &str = "gpt-4o";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for the OpenAI API. Handles IGFB and YouTube generation, and
/// embeddings for the similarity gate.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    #[must_use]
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    /// Generate IGFB or YouTube copy for a content slot.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey("OPENAI"))?;

        let system = build_system_prompt(request.platform, request.forbidden_phrases);
        let user = build_user_prompt(request);

        let chat_request = ChatRequest {
            model: CHAT_MODEL,
            temperature: 0.85,
            max_tokens: 2048,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&chat_request)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "OpenAI",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "OpenAI",
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "OpenAI",
                source,
            })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::Empty { provider: "OpenAI" })
    }

    /// Compute an embedding vector for the given text (truncated to 8000
    /// characters).
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey("OPENAI"))?;

        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: truncate_chars(text, 8000),
        };

        let response = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "OpenAI",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "OpenAI",
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Request {
                    provider: "OpenAI",
                    source,
                })?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(ProviderError::Empty { provider: "OpenAI" })
    }
}

fn build_system_prompt(platform: Platform, forbidden_phrases: &[String]) -> String {
    let platform_guide = if platform == Platform::Igfb {
        "Instagram/Facebook post: 150-250 words. Engaging opening hook, personal insight, \
         call to action. Use line breaks for readability. Include 3-5 relevant hashtags at the end."
    } else {
        "YouTube video script outline: 300-500 words. Include: Hook (15 seconds), Intro, \
         3 Main Points, Call to Action. Write in a natural speaking style."
    };

    format!(
        "You are writing social media content for Liz Sears at Utah's Elite Realtors.\n\n\
         Voice: Warm, approachable, knowledgeable about Utah real estate.\n\
         {platform_guide}\n\n\
         Rules:\n\
         - NEVER use em dash (\u{2014})\n\
         - Avoid these phrases: {}\n\
         - Keep it authentic and conversational\n\
         - Reference Utah-specific details when relevant",
        forbidden_phrases.join(", ")
    )
}

fn build_user_prompt(request: &GenerationRequest<'_>) -> String {
    let context_block = if request.research_context.is_empty() {
        String::new()
    } else {
        format!("Research context:\n{}\n\n---\n\n", request.research_context)
    };

    format!(
        "{context_block}Topic: {}\nContent Type: {}\n\nWrite the {} content now.",
        request.topic,
        request.content_type.as_str(),
        request.platform.as_str()
    )
}
