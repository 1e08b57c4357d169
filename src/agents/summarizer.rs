//! Summarizer Agent
//!
//! Asks the configured completion provider for a title and a one-paragraph
//! summary of a document excerpt. A response that cannot be parsed is a soft
//! failure: the filename stands in for the title and a placeholder for the
//! summary. Provider failures (auth, rate limit, timeout, other) are returned
//! to the caller.

use futures::FutureExt;
use serde::Deserialize;
use tracing::debug;

use crate::llm::LLM;
use crate::models::ExtractedContent;
use crate::types::{LLMMessage, LLMRequest, ProviderError};
use crate::utils::retry::{with_retry, RetryPolicy};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that analyzes documents and extracts key information. Always respond with valid JSON.";

pub const SUMMARY_PLACEHOLDER: &str = "Unable to generate summary";

const TRUNCATION_MARKER: &str = "... [content truncated]";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub title: String,
    pub summary: String,
    /// Fallback values were used because the response was unusable
    pub degraded: bool,
}

impl DocumentSummary {
    fn fallback(filename: &str) -> Self {
        Self {
            title: filename.to_string(),
            summary: SUMMARY_PLACEHOLDER.to_string(),
            degraded: true,
        }
    }

    /// Stand-in for files whose extraction produced no text
    pub fn metadata_only(filename: &str, extension: &str) -> Self {
        Self {
            title: filename.to_string(),
            summary: format!(
                "File type: .{}. Content analysis not available for this file type.",
                extension
            ),
            degraded: false,
        }
    }
}

#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

pub struct SummarizerAgent {
    llm: LLM,
    retry: RetryPolicy,
}

impl SummarizerAgent {
    pub fn new(llm: LLM, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub fn build_prompt(content: &ExtractedContent) -> String {
        let mut excerpt = content.text.clone();
        if content.is_truncated() {
            excerpt.push('\n');
            excerpt.push_str(TRUNCATION_MARKER);
        }

        format!(
            r#"Analyze the following document and provide:
1. A concise title that best represents the document's content
2. A one-paragraph summary (3-5 sentences) describing the key points and purpose of the document

Document filename: {}

Document content:
{}

Please respond in the following JSON format:
{{
  "title": "Your extracted or generated title here",
  "summary": "Your one-paragraph summary here"
}}"#,
            content.filename, excerpt
        )
    }

    /// One completion per file (plus bounded retries for transient failures when enabled)
    pub async fn summarize(&self, content: &ExtractedContent) -> Result<DocumentSummary, ProviderError> {
        let request = LLMRequest {
            model: self.llm.model().to_string(),
            messages: vec![
                LLMMessage::system(SYSTEM_PROMPT),
                LLMMessage::user(Self::build_prompt(content)),
            ],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        };

        let response = with_retry(
            || self.llm.create_chat_completion(&request).boxed(),
            self.retry,
            |e: &ProviderError| e.kind.is_transient(),
        )
        .await?;

        debug!(
            file = %content.filename,
            provider = %self.llm.provider(),
            total_tokens = response.usage.total_tokens,
            "Summary received"
        );

        Ok(Self::parse_response(&content.filename, &response.content))
    }

    pub fn parse_response(filename: &str, raw: &str) -> DocumentSummary {
        let body = strip_code_fence(raw);

        let parsed: RawSummary = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(file = %filename, error = %e, "AI response is not valid JSON, using fallback values");
                return DocumentSummary::fallback(filename);
            }
        };

        let title = match parsed.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(title) => title,
            None => {
                debug!(file = %filename, "AI response has no title, using fallback values");
                return DocumentSummary::fallback(filename);
            }
        };

        match parsed.summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(summary) => DocumentSummary {
                title,
                summary,
                degraded: false,
            },
            None => {
                debug!(file = %filename, "AI response has no summary");
                DocumentSummary {
                    title,
                    summary: SUMMARY_PLACEHOLDER.to_string(),
                    degraded: true,
                }
            }
        }
    }
}

/// Remove a surrounding ``` / ```json fence if present
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let body = match rest.rfind("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    body.trim()
}
