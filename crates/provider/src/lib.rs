//! Completion providers
//!
//! A provider maps a system prompt plus an opaque message list to generated
//! text and the model's auxiliary reasoning ("thoughts").

use async_trait::async_trait;
use serde_json::Value;

use thiserror::Error;
use tracing::{debug, trace};

pub mod anthropic;

pub use anthropic::AnthropicProvider;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider rejected request: {0}")]
    Api(String),

    #[error("no provider api key configured")]
    NoApiKey,

    #[error("provider response had no content")]
    InvalidResponse,

    #[error("provider rate limited the request")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Conversation handed to the provider as-is
///
/// Records are opaque to everything but the provider backend.
pub type MessageList = Vec<Value>;

/// Token accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider output
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub thoughts: Value,
    pub stop_reason: String,
    pub usage: Usage,
}

impl Completion {
    /// Text-only completion with no reasoning attached
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            thoughts: Value::String(String::new()),
            stop_reason: "end_turn".to_string(),
            usage: Usage::default(),
        }
    }

    pub fn with_thoughts(mut self, thoughts: impl Into<Value>) -> Self {
        self.thoughts = thoughts.into();
        self
    }
}

/// Request parameters
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub model: String,
    pub system: String,
    pub messages: MessageList,
    pub max_tokens: u32,
    pub thinking_budget: Option<u32>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            system: String::new(),
            messages: Vec::new(),
            max_tokens: 16000,
            thinking_budget: None,
        }
    }
}

/// Completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, params: CompletionParams) -> Result<Completion>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Join the non-empty pieces of a multi-block response
pub(crate) fn join_blocks<'a>(blocks: impl Iterator<Item = &'a str>, sep: &str) -> String {
    let parts: Vec<&str> = blocks.filter(|b| !b.is_empty()).collect();
    trace!("joining {} content blocks", parts.len());
    parts.join(sep)
}

pub(crate) fn log_usage(usage: &Usage) {
    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "completion usage"
    );
}
