//! One-turn agent invocation

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use machina_config::Config;
use machina_prompt::PromptSource;
use machina_provider::{CompletionParams, MessageList, Provider};

use crate::{AgentError, Result};

/// Per-call provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub thinking_budget: Option<u32>,
    /// Deadline for a single provider call
    pub timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 16000,
            thinking_budget: None,
            timeout: Duration::from_secs(300),
        }
    }
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            thinking_budget: config.provider.thinking_budget,
            timeout: config.provider_timeout(),
        }
    }
}

/// Result of one invocation: the generated text and the model's reasoning
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    pub thoughts: Value,
}

/// Something that answers a message list
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(&self, messages: MessageList) -> Result<Invocation>;
}

/// Resolves the system prompt and calls the provider with it
pub struct Agent<P: Provider, S: PromptSource> {
    provider: P,
    prompt: S,
    settings: AgentSettings,
}

impl<P: Provider, S: PromptSource> Agent<P, S> {
    pub fn new(provider: P, prompt: S, settings: AgentSettings) -> Self {
        Self {
            provider,
            prompt,
            settings,
        }
    }
}

#[async_trait]
impl<P: Provider, S: PromptSource> Invoke for Agent<P, S> {
    async fn invoke(&self, messages: MessageList) -> Result<Invocation> {
        let system = self.prompt.resolve_prompt().await?;
        debug!(
            messages = messages.len(),
            prompt_chars = system.len(),
            "invoking provider"
        );

        let model = if self.settings.model.is_empty() {
            self.provider.default_model()
        } else {
            self.settings.model.clone()
        };

        let params = CompletionParams {
            model,
            system,
            messages,
            max_tokens: self.settings.max_tokens,
            thinking_budget: self.settings.thinking_budget,
        };

        let completion =
            match tokio::time::timeout(self.settings.timeout, self.provider.complete(params)).await
            {
                Ok(result) => result?,
                Err(_) => return Err(AgentError::Timeout(self.settings.timeout)),
            };

        info!(
            stop_reason = %completion.stop_reason,
            chars = completion.text.len(),
            "invocation complete"
        );

        Ok(Invocation {
            text: completion.text,
            thoughts: completion.thoughts,
        })
    }
}
