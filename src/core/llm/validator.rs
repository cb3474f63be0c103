//! Credential Validation
//!
//! A user-initiated liveness check: one minimal request through the
//! active adapter. Unlike the dispatch path, a 401 here must NOT clear
//! the stored key; the user is probing, not operating.

use super::dispatcher::AiClient;
use super::error::{classify_status, AiError, Result};
use super::types::PromptRequest;

const VALIDATION_MAX_TOKENS: u32 = 10;

impl AiClient {
    /// Confirm the active provider's stored key is live.
    ///
    /// Returns immediately, without network access, when no key is set.
    /// Failures are classified with the usual taxonomy but leave the
    /// stored credentials untouched.
    pub async fn validate_key(&self) -> Result<()> {
        let record = self.load_credentials();
        if !record.is_authenticated() {
            return Err(AiError::NotConfigured(record.provider));
        }

        let adapter = self.adapter_for(record.provider);
        let prompt = PromptRequest {
            system_prompt: None,
            user_message: "hi".to_string(),
            max_tokens: VALIDATION_MAX_TOKENS,
        };
        let wire = adapter.build_request(&prompt, &record)?;

        let (status, body) = self.send(&wire).await?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(classify_status(status, body))
        }
    }
}
