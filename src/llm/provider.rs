use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse, ProviderError};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError>;
}

/// Connection settings for one of the two supported completion backends
#[derive(Debug, Clone, PartialEq)]
pub enum AiProviderConfig {
    OpenAI {
        api_key: String,
        model: String,
        api_base: String,
    },
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

impl AiProviderConfig {
    pub fn provider(&self) -> LLMProvider {
        match self {
            AiProviderConfig::OpenAI { .. } => LLMProvider::OpenAI,
            AiProviderConfig::Azure { .. } => LLMProvider::AzureOpenAI,
        }
    }

    /// Model name for OpenAI, deployment name for Azure
    pub fn model(&self) -> &str {
        match self {
            AiProviderConfig::OpenAI { model, .. } => model,
            AiProviderConfig::Azure { deployment, .. } => deployment,
        }
    }
}

/// Provider-agnostic completion client
pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider: LLMProvider,
    model: String,
}

impl LLM {
    pub fn from_config(config: &AiProviderConfig, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let adapter: Box<dyn LLMAdapter> = match config {
            AiProviderConfig::OpenAI { api_key, api_base, .. } => Box::new(
                crate::llm::openai::OpenAIAdapter::new_with_api_base(client, api_key, api_base),
            ),
            AiProviderConfig::Azure {
                endpoint,
                api_key,
                deployment,
                api_version,
            } => Box::new(crate::llm::azure::AzureOpenAIAdapter::new(
                client,
                endpoint,
                api_key,
                deployment,
                api_version,
            )),
        };

        Ok(Self {
            adapter,
            provider: config.provider(),
            model: config.model().to_string(),
        })
    }

    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, provider: LLMProvider, model: impl Into<String>) -> Self {
        Self {
            adapter,
            provider,
            model: model.into(),
        }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        self.adapter.create_chat_completion(request).await
    }
}
