//! Shared test fixtures.

#![allow(dead_code)]

use crate::core::credentials::{
    BackendKind, CredentialStore, MemoryBackend, StoreBackend, StoreError, StoreMap,
};
use crate::core::llm::{AiClient, Provider};

/// A store over a throwaway in-memory backend.
pub fn memory_store() -> CredentialStore {
    CredentialStore::with_backend(Box::new(MemoryBackend::new()))
}

/// A memory store pre-loaded with a key and the matching active
/// provider.
pub fn store_with_key(provider: Provider, key: &str) -> CredentialStore {
    let store = memory_store();
    store.set_provider(provider).unwrap();
    store.set_api_key(provider, key).unwrap();
    store
}

/// A client whose provider endpoints both point at a mock server.
pub fn client_against(server_uri: &str, store: CredentialStore) -> AiClient {
    AiClient::builder()
        .with_store(store)
        .with_anthropic_base_url(format!("{server_uri}/v1"))
        .with_gemini_url(format!(
            "{server_uri}/v1beta/models/gemini-2.0-flash:generateContent"
        ))
        .build()
}

/// An Anthropic Messages API success body wrapping `text`.
pub fn claude_success_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "model": "claude-sonnet-4-20250514",
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 10, "output_tokens": 20 }
    })
}

/// A Generative Language API success body wrapping `text`.
pub fn gemini_success_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

/// Backend whose writes always fail. Reads serve the initial map.
pub struct FailingBackend {
    initial: StoreMap,
}

impl FailingBackend {
    pub fn new(initial: StoreMap) -> Self {
        Self { initial }
    }
}

impl StoreBackend for FailingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn read_all(&self) -> Result<StoreMap, StoreError> {
        Ok(self.initial.clone())
    }

    fn write_all(&self, _map: &StoreMap) -> Result<(), StoreError> {
        Err(StoreError::Verification("injected write failure".to_string()))
    }
}
