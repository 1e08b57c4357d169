use async_trait::async_trait;
use reqwest::Client;

use crate::llm::openai::{AuthHeader, OpenAIAdapter};
use crate::llm::provider::LLMAdapter;
use crate::types::{LLMProvider, LLMRequest, LLMResponse, ProviderError};

/// Azure OpenAI deployment; same wire format as OpenAI, different URL and auth header
pub struct AzureOpenAIAdapter {
    inner: OpenAIAdapter,
}

impl AzureOpenAIAdapter {
    pub fn new(client: Client, endpoint: &str, api_key: &str, deployment: &str, api_version: &str) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );

        Self {
            inner: OpenAIAdapter::with_endpoint(
                client,
                url,
                AuthHeader::ApiKey(api_key.to_string()),
                LLMProvider::AzureOpenAI,
            ),
        }
    }

    pub fn url(&self) -> &str {
        self.inner.url()
    }
}

#[async_trait]
impl LLMAdapter for AzureOpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        self.inner.create_chat_completion(request).await
    }
}
