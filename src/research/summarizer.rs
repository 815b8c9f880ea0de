use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ai::{truncate_chars, AnthropicClient};

/// A summarized research snippet with actionable bullet points.
#[derive(Debug, Clone)]
pub struct ResearchSummary {
    pub text: String,
    pub key_points: Vec<KeyPoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoint {
    pub point: String,
    pub relevance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryPayload {
    summary: Option<String>,
    #[serde(default)]
    key_points: Vec<KeyPoint>,
}

/// Summarize scraped research content for prompt injection.
///
/// The model is asked to answer with a JSON block; responses that carry
/// no parseable JSON fall back to the leading text.
///
/// # Errors
///
/// Returns an error if the Anthropic call fails.
pub async fn summarize_content(
    anthropic: &AnthropicClient,
    content: &str,
    category: &str,
) -> Result<ResearchSummary> {
    let prompt = format!(
        "You are summarizing research content for Utah real estate content creation.\n\n\
         Category: {category}\n\n\
         Content to summarize:\n{}\n\n\
         Extract:\n\
         1. A concise summary (150-200 words) of key insights relevant to Utah real estate professionals\n\
         2. 3-5 bullet points of actionable insights\n\n\
         Format as JSON:\n\
         {{\n\
           \"summary\": \"...\",\n\
           \"keyPoints\": [\n\
             {{ \"point\": \"...\", \"relevance\": \"Why this matters for content\" }}\n\
           ]\n\
         }}",
        truncate_chars(content, 8000)
    );

    let response = anthropic
        .complete(None, &prompt, 2000, None)
        .await
        .context("Failed to summarize research content")?;

    Ok(parse_summary(&response))
}

/// Extract the JSON payload from a model response, tolerating surrounding
/// prose and markdown fences.
fn parse_summary(response: &str) -> ResearchSummary {
    let fallback = || ResearchSummary {
        text: truncate_chars(response, 500).to_string(),
        key_points: Vec::new(),
    };

    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return fallback();
    };
    if end < start {
        return fallback();
    }

    match serde_json::from_str::<SummaryPayload>(&response[start..=end]) {
        Ok(payload) => ResearchSummary {
            text: payload
                .summary
                .unwrap_or_else(|| truncate_chars(response, 500).to_string()),
            key_points: payload.key_points,
        },
        Err(_) => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_json() {
        let response = r#"Here you go:
{"summary": "Rates dipped this week.", "keyPoints": [{"point": "Rates down", "relevance": "Buyer urgency"}]}"#;

        let summary = parse_summary(response);
        assert_eq!(summary.text, "Rates dipped this week.");
        assert_eq!(summary.key_points.len(), 1);
        assert_eq!(summary.key_points[0].point, "Rates down");
    }

    #[test]
    fn test_parse_summary_without_json_falls_back() {
        let summary = parse_summary("Plain prose with no structure at all.");
        assert_eq!(summary.text, "Plain prose with no structure at all.");
        assert!(summary.key_points.is_empty());
    }

    #[test]
    fn test_parse_summary_bad_json_falls_back() {
        let summary = parse_summary("{not valid json}");
        assert_eq!(summary.text, "{not valid json}");
        assert!(summary.key_points.is_empty());
    }
}
