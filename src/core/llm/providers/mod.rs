//! Provider Adapters
//!
//! Concrete implementations of the `ProviderAdapter` trait, one per
//! supported cloud provider. An adapter knows how to build its API's
//! wire request and how to dig the text out of its response shape; the
//! dispatcher owns sending and error classification.

mod claude;
mod gemini;

pub use claude::{ClaudeAdapter, ANTHROPIC_API_BASE_URL, ANTHROPIC_API_VERSION};
pub use gemini::{GeminiAdapter, GEMINI_API_URL};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::credentials::CredentialRecord;

use super::error::Result;
use super::types::{PromptRequest, WireRequest};

// ============================================================================
// Provider Selection
// ============================================================================

/// The two supported providers. Closed on purpose: adding a provider
/// means the compiler walks every dispatch site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Claude,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Claude => write!(f, "claude"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unrecognized provider: {0}")]
pub struct ParseProviderError(String);

impl std::str::FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "claude" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

// ============================================================================
// Adapter Trait
// ============================================================================

/// Provider-specific strategy for request building and response
/// parsing. Implementations are stateless apart from their endpoint,
/// so the dispatcher binds one per operation at dispatch time.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Build headers and body for this provider's API.
    fn build_request(
        &self,
        prompt: &PromptRequest,
        credentials: &CredentialRecord,
    ) -> Result<WireRequest>;

    /// Extract the first text-bearing block from a success body.
    /// A missing field is an explicit `NoContent`, never a panic.
    fn extract_text(&self, body: &serde_json::Value) -> Result<String>;
}
