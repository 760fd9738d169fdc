//! LLM provider abstraction layer.
//!
//! The recommendation generator talks to a text-generation backend through
//! the [`LlmProvider`] trait, so any OpenAI-compatible API (hosted, or a
//! local server exposing `/v1`) and test doubles are interchangeable.

mod openai;
mod provider;
mod types;

pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};

use crate::config::{LlmProviderKind, LlmSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds the configured provider, `None` when generation is disabled.
pub fn build_provider(settings: &LlmSettings) -> Option<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match settings.provider {
        LlmProviderKind::Disabled => {
            info!("LLM provider disabled, recommendations will use the static catalog");
            return None;
        }
        LlmProviderKind::OpenAI => {
            let api_key_source = match (&settings.api_key_command, &settings.api_key) {
                (Some(command), _) => ApiKeySource::Command(command.clone()),
                (None, Some(key)) => ApiKeySource::Static(key.clone()),
                (None, None) => ApiKeySource::None,
            };
            Arc::new(OpenAIProvider::new(
                settings.base_url.clone(),
                settings.model.clone(),
                api_key_source,
            ))
        }
    };
    info!(
        "Using LLM provider {} with model {} at {}",
        provider.name(),
        provider.model(),
        settings.base_url
    );
    Some(provider)
}

/// Completion options derived from the LLM settings.
pub fn completion_options(settings: &LlmSettings) -> CompletionOptions {
    CompletionOptions {
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        timeout: Duration::from_secs(settings.timeout_secs),
    }
}
