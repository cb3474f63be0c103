//! Claude Adapter Unit Tests
//!
//! Request formatting and response parsing for the Anthropic Messages
//! API shape. No network.

use crate::core::credentials::CredentialRecord;
use crate::core::llm::{
    AiError, ClaudeAdapter, PromptRequest, Provider, ProviderAdapter, ANTHROPIC_API_VERSION,
};
use crate::tests::common::claude_success_body;

fn credentials() -> CredentialRecord {
    CredentialRecord {
        claude_api_key: Some("sk-ant-test".to_string()),
        ..CredentialRecord::default()
    }
}

fn prompt() -> PromptRequest {
    PromptRequest {
        system_prompt: Some("You are helpful".to_string()),
        user_message: "Analyze this command: ls".to_string(),
        max_tokens: 512,
    }
}

// =============================================================================
// Request Formatting
// =============================================================================

#[test]
fn test_build_request_url_and_headers() {
    let adapter = ClaudeAdapter::new();
    let wire = adapter.build_request(&prompt(), &credentials()).unwrap();

    assert_eq!(wire.url, "https://api.anthropic.com/v1/messages");
    assert!(wire
        .headers
        .contains(&("x-api-key", "sk-ant-test".to_string())));
    assert!(wire
        .headers
        .contains(&("anthropic-version", ANTHROPIC_API_VERSION.to_string())));
    assert!(wire
        .headers
        .contains(&("content-type", "application/json".to_string())));
}

#[test]
fn test_build_request_body_shape() {
    let adapter = ClaudeAdapter::new();
    let wire = adapter.build_request(&prompt(), &credentials()).unwrap();

    assert_eq!(
        wire.body["model"].as_str(),
        Some("claude-sonnet-4-20250514")
    );
    assert_eq!(wire.body["max_tokens"].as_u64(), Some(512));
    assert_eq!(wire.body["system"].as_str(), Some("You are helpful"));
    assert_eq!(wire.body["messages"][0]["role"].as_str(), Some("user"));
    assert_eq!(
        wire.body["messages"][0]["content"].as_str(),
        Some("Analyze this command: ls")
    );
}

#[test]
fn test_build_request_omits_empty_system_prompt() {
    let adapter = ClaudeAdapter::new();
    let mut request = prompt();
    request.system_prompt = None;
    let wire = adapter.build_request(&request, &credentials()).unwrap();
    assert!(wire.body.get("system").is_none());
}

#[test]
fn test_build_request_respects_stored_model() {
    let adapter = ClaudeAdapter::new();
    let mut creds = credentials();
    creds.claude_model = "claude-haiku-4-5-20251001".to_string();
    let wire = adapter.build_request(&prompt(), &creds).unwrap();
    assert_eq!(
        wire.body["model"].as_str(),
        Some("claude-haiku-4-5-20251001")
    );
}

#[test]
fn test_build_request_without_key_is_not_configured() {
    let adapter = ClaudeAdapter::new();
    let mut creds = credentials();
    creds.claude_api_key = Some(String::new());
    match adapter.build_request(&prompt(), &creds) {
        Err(AiError::NotConfigured(Provider::Claude)) => {}
        other => panic!("expected NotConfigured, got {other:?}"),
    }
}

#[test]
fn test_base_url_override() {
    let adapter = ClaudeAdapter::with_base_url("http://localhost:9999/v1");
    let wire = adapter.build_request(&prompt(), &credentials()).unwrap();
    assert_eq!(wire.url, "http://localhost:9999/v1/messages");
}

// =============================================================================
// Response Parsing
// =============================================================================

#[test]
fn test_extract_text_happy_path() {
    let adapter = ClaudeAdapter::new();
    let body = claude_success_body("hello there");
    assert_eq!(adapter.extract_text(&body).unwrap(), "hello there");
}

#[test]
fn test_extract_text_missing_content_is_no_content() {
    let adapter = ClaudeAdapter::new();
    let body = serde_json::json!({ "content": [] });
    assert!(matches!(
        adapter.extract_text(&body),
        Err(AiError::NoContent)
    ));

    let body = serde_json::json!({ "model": "x" });
    assert!(matches!(
        adapter.extract_text(&body),
        Err(AiError::NoContent)
    ));
}

#[test]
fn test_extract_text_rejects_non_text_first_block() {
    let adapter = ClaudeAdapter::new();
    let body = serde_json::json!({
        "content": [{ "type": "tool_use", "id": "t1", "name": "f", "input": {} }]
    });
    assert!(matches!(
        adapter.extract_text(&body),
        Err(AiError::NoContent)
    ));
}
