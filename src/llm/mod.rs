// LLM abstraction layer

pub mod azure;
pub mod openai;
pub mod provider;

pub use provider::*;
pub use crate::types::{LLMMessage, LLMProvider, LLMRequest, LLMResponse, ProviderError, ProviderErrorKind, TokenUsage};
