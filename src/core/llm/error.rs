//! Error taxonomy for dispatch and validation.

use thiserror::Error;

use crate::core::credentials::StoreError;

use super::providers::Provider;

#[derive(Debug, Error)]
pub enum AiError {
    /// No key is stored for the active provider. Never touches the
    /// network.
    #[error("No {0} API key configured")]
    NotConfigured(Provider),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401. The dispatch path clears the stored key when this comes
    /// back; the validator does not.
    #[error("API key invalid or expired")]
    InvalidKey,

    /// 403.
    #[error("API key lacks permission for this operation")]
    Forbidden,

    /// 429.
    #[error("Rate limited. Please wait a moment")]
    RateLimited,

    /// 529, provider-side.
    #[error("Provider is temporarily overloaded. Try again")]
    Overloaded,

    /// Any other non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Success status but nothing extractable in the response body.
    #[error("No text content in provider response")]
    NoContent,

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AiError>;

/// Map a non-success transport status to an error kind. The mapping is
/// provider-independent; both APIs use the same status conventions.
pub fn classify_status(status: u16, body: String) -> AiError {
    match status {
        401 => AiError::InvalidKey,
        403 => AiError::Forbidden,
        429 => AiError::RateLimited,
        529 => AiError::Overloaded,
        _ => AiError::Api { status, body },
    }
}
