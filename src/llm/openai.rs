// OpenAI chat-completions adapter
// Also serves any OpenAI-compatible endpoint (Azure wraps it with its own URL and auth header)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extraction::truncate_chars;
use crate::llm::provider::LLMAdapter;
use crate::types::{LLMProvider, LLMRequest, LLMResponse, ProviderError, ProviderErrorKind, TokenUsage};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Non-JSON error bodies (proxy HTML pages and the like) are clipped to this many characters
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub(crate) enum AuthHeader {
    /// `Authorization: Bearer <key>`
    Bearer(String),
    /// `api-key: <key>`
    ApiKey(String),
}

pub struct OpenAIAdapter {
    client: Client,
    url: String,
    auth: AuthHeader,
    provider: LLMProvider,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl OpenAIAdapter {
    pub fn new(client: Client, api_key: &str) -> Self {
        Self::new_with_api_base(client, api_key, OPENAI_API_BASE)
    }

    pub fn new_with_api_base(client: Client, api_key: &str, api_base: &str) -> Self {
        Self {
            client,
            url: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            auth: AuthHeader::Bearer(api_key.to_string()),
            provider: LLMProvider::OpenAI,
        }
    }

    pub(crate) fn with_endpoint(client: Client, url: String, auth: AuthHeader, provider: LLMProvider) -> Self {
        Self {
            client,
            url,
            auth,
            provider,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn error(&self, kind: ProviderErrorKind, message: impl Into<String>) -> ProviderError {
        ProviderError::new(self.provider, kind, message)
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let body = ChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let builder = self.client.post(&self.url).json(&body);
        let builder = match &self.auth {
            AuthHeader::Bearer(key) => builder.bearer_auth(key),
            AuthHeader::ApiKey(key) => builder.header("api-key", key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.provider, &e))?;

        let status = response.status();
        if !status.is_success() {
            let kind = ProviderErrorKind::from_status(status.as_u16());
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&error_text) {
                let code = parsed
                    .error
                    .code
                    .map(|c| format!(" (code: {})", c))
                    .unwrap_or_default();
                return Err(self.error(kind, format!("{}: {}{}", status, parsed.error.message, code)));
            }

            let (body, clipped) = truncate_chars(error_text.trim(), MAX_ERROR_BODY_CHARS);
            let ellipsis = if clipped { "..." } else { "" };
            return Err(self.error(kind, format!("{}: {}{}", status, body, ellipsis)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.error(ProviderErrorKind::Other, format!("Failed to parse response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.error(ProviderErrorKind::Other, "response contained no choices"))?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            provider = %self.provider,
            total_tokens = usage.total_tokens,
            "Completion received"
        );

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or_default(),
            usage,
        })
    }
}
