//! Claude Adapter (Anthropic Messages API)
//!
//! Auth: `x-api-key` header with an API key from console.anthropic.com.
//! API docs: https://docs.anthropic.com/en/api/messages

use crate::core::credentials::CredentialRecord;
use crate::core::llm::error::{AiError, Result};
use crate::core::llm::types::{PromptRequest, WireRequest};

use super::{Provider, ProviderAdapter};

pub const ANTHROPIC_API_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic Messages API.
pub struct ClaudeAdapter {
    base_url: String,
}

impl Default for ClaudeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeAdapter {
    pub fn new() -> Self {
        Self::with_base_url(ANTHROPIC_API_BASE_URL)
    }

    /// Point the adapter at a different base URL (mock servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ProviderAdapter for ClaudeAdapter {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn build_request(
        &self,
        prompt: &PromptRequest,
        credentials: &CredentialRecord,
    ) -> Result<WireRequest> {
        let api_key = credentials
            .claude_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AiError::NotConfigured(Provider::Claude))?;

        let mut body = serde_json::json!({
            "model": credentials.claude_model,
            "max_tokens": prompt.max_tokens,
            "messages": [{ "role": "user", "content": prompt.user_message }],
        });
        if let Some(system) = prompt.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            body["system"] = serde_json::json!(system);
        }

        Ok(WireRequest {
            url: format!("{}/messages", self.base_url),
            headers: vec![
                ("x-api-key", api_key.to_string()),
                ("anthropic-version", ANTHROPIC_API_VERSION.to_string()),
                ("content-type", "application/json".to_string()),
            ],
            body,
        })
    }

    /// Success shape:
    /// `{ "content": [{ "type": "text", "text": "..." }], "model": "...",
    ///    "stop_reason": "...", "usage": {...} }`
    fn extract_text(&self, body: &serde_json::Value) -> Result<String> {
        body["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .filter(|block| block["type"].as_str() == Some("text"))
            .and_then(|block| block["text"].as_str())
            .map(str::to_string)
            .ok_or(AiError::NoContent)
    }
}
