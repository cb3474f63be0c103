//! Gemini Adapter (Google Generative Language API)
//!
//! Auth: `x-goog-api-key` header. The generate-content URL is fixed;
//! model selection is baked into the path.

use crate::core::credentials::CredentialRecord;
use crate::core::llm::error::{AiError, Result};
use crate::core::llm::types::{PromptRequest, WireRequest};

use super::{Provider, ProviderAdapter};

pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Adapter for the Google Generative Language API.
pub struct GeminiAdapter {
    url: String,
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self::with_url(GEMINI_API_URL)
    }

    /// Point the adapter at a different generate-content URL (mock
    /// servers).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn build_request(
        &self,
        prompt: &PromptRequest,
        credentials: &CredentialRecord,
    ) -> Result<WireRequest> {
        let api_key = credentials
            .gemini_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AiError::NotConfigured(Provider::Gemini))?;

        // No separate system slot in this body shape; fold the system
        // prompt into the single text part.
        let text = match prompt.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            Some(system) => format!("{system}\n\n{}", prompt.user_message),
            None => prompt.user_message.clone(),
        };

        Ok(WireRequest {
            url: self.url.clone(),
            headers: vec![
                ("x-goog-api-key", api_key.to_string()),
                ("content-type", "application/json".to_string()),
            ],
            body: serde_json::json!({
                "contents": [{ "parts": [{ "text": text }] }],
            }),
        })
    }

    /// Success shape:
    /// `{ "candidates": [{ "content": { "parts": [{ "text": "..." }] } }] }`
    fn extract_text(&self, body: &serde_json::Value) -> Result<String> {
        body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate["content"]["parts"].as_array())
            .and_then(|parts| parts.first())
            .and_then(|part| part["text"].as_str())
            .map(str::to_string)
            .ok_or(AiError::NoContent)
    }
}
