//! LLM completion clients used for test generation and remediation hints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{LlmProvider, LlmSettings};

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAIClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}

/// Build the configured client.
pub fn from_settings(settings: &LlmSettings, api_key: &str) -> Arc<dyn LlmClient> {
    let model = settings.model().to_string();
    match settings.provider {
        LlmProvider::OpenAI => {
            let mut client = OpenAIClient::new(
                model,
                api_key.to_string(),
                settings.temperature,
                settings.max_tokens,
            );
            if let Some(url) = &settings.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        LlmProvider::Anthropic => {
            let mut client = AnthropicClient::new(
                model,
                api_key.to_string(),
                settings.temperature,
                settings.max_tokens,
            );
            if let Some(url) = &settings.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
    }
}
