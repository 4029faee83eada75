//! Anthropic Messages API backend

use crate::*;
use reqwest::Client;
use serde_json::json;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Anthropic provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let default_model = default_model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base,
            default_model,
        }
    }

    fn build_request(&self, params: &CompletionParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let mut body = json!({
            "model": model,
            "max_tokens": params.max_tokens,
            "messages": params.messages,
        });

        if !params.system.is_empty() {
            body["system"] = json!(params.system);
        }

        if let Some(budget) = params.thinking_budget {
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": budget,
            });
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion> {
        let blocks = json["content"]
            .as_array()
            .ok_or(ProviderError::InvalidResponse)?;

        let text = join_blocks(
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str()),
            "",
        );

        let thoughts = join_blocks(
            blocks
                .iter()
                .filter(|b| b["type"] == "thinking")
                .filter_map(|b| b["thinking"].as_str()),
            "\n\n",
        );

        let redacted = blocks
            .iter()
            .filter(|b| b["type"] == "redacted_thinking")
            .count();
        if redacted > 0 {
            debug!("dropping {} redacted thinking blocks", redacted);
        }

        let stop_reason = json["stop_reason"]
            .as_str()
            .unwrap_or("end_turn")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                input_tokens: usage
                    .get("input_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                output_tokens: usage
                    .get("output_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
            }
        } else {
            Usage::default()
        };

        Ok(Completion {
            text,
            thoughts: serde_json::Value::String(thoughts),
            stop_reason,
            usage,
        })
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            let kind = json["error"]["type"].as_str().unwrap_or("error").to_string();
            json["error"]["message"]
                .as_str()
                .map(|msg| format!("{}: {}", kind, msg))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn complete(&self, params: CompletionParams) -> Result<Completion> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/v1/messages", self.api_base);
        trace!("posting completion request to {}", url);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Api(format!(
                "{} ({})",
                error_message(&text),
                status.as_u16()
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let completion = self.parse_response(json)?;
        log_usage(&completion.usage);
        debug!(
            stop_reason = %completion.stop_reason,
            chars = completion.text.len(),
            "completion received"
        );
        Ok(completion)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
