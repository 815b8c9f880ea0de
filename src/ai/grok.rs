use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{truncate_chars, GenerationRequest, ProviderError};
use crate::config::Config;

const GROK_MODEL: &str = "grok-3";

// Grok uses the OpenAI-compatible chat wire format.
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

/// Client for the xAI Grok API. Handles X (Twitter) post generation.
#[derive(Debug, Clone)]
pub struct GrokClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GrokClient {
    #[must_use]
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            api_key: config.grok_api_key.clone(),
            base_url: config.grok_base_url.clone(),
        }
    }

    /// Generate an X post for a content slot.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey("GROK"))?;

        let system = build_system_prompt(request.forbidden_phrases);
        let user = build_user_prompt(request);

        let chat_request = ChatRequest {
            model: GROK_MODEL,
            temperature: 0.85,
            max_tokens: 256,
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
                provider: "Grok",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "Grok",
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "Grok",
                source,
            })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::Empty { provider: "Grok" })
    }
}

fn build_system_prompt(forbidden_phrases: &[String]) -> String {
    format!(
        "You are writing an X (Twitter) post for Liz Sears at Utah's Elite Realtors.\n\n\
         Rules:\n\
         - Maximum 280 characters\n\
         - Punchy, engaging, and direct\n\
         - Include relevant hashtag(s) if space allows\n\
         - Avoid: {}\n\
         - Reference Utah real estate when relevant",
        forbidden_phrases.join(", ")
    )
}

fn build_user_prompt(request: &GenerationRequest<'_>) -> String {
    let context_block = if request.research_context.is_empty() {
        String::new()
    } else {
        format!("Context: {}\n\n", truncate_chars(request.research_context, 500))
    };

    format!(
        "{context_block}Topic: {}\nType: {}\n\nWrite an X post.",
        request.topic,
        request.content_type.as_str()
    )
}
