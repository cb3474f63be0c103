//! Structured-Parse Properties
//!
//! Fence stripping and parse degradation must hold for arbitrary model
//! output, not just the shapes we expect.

use proptest::prelude::*;

use crate::core::llm::types::{
    parse_command_analysis, strip_code_fence, DEGRADED_CONFIDENCE,
};

proptest! {
    /// Stripping twice changes nothing, for any input.
    #[test]
    fn strip_code_fence_is_idempotent(text in ".*") {
        let once = strip_code_fence(&text);
        prop_assert_eq!(strip_code_fence(once), once);
    }

    /// A fenced JSON payload parses the same as the bare payload.
    #[test]
    fn fence_wrapping_is_transparent(
        suggestion in "[a-zA-Z0-9 _.-]{1,40}",
        confidence in 0.0f32..=1.0f32,
    ) {
        let payload = serde_json::json!({
            "suggestion": suggestion,
            "confidence": confidence,
        })
        .to_string();
        let fenced = format!("```json\n{payload}\n```");

        let bare = parse_command_analysis(&payload);
        let wrapped = parse_command_analysis(&fenced);
        prop_assert_eq!(bare, wrapped);
    }

    /// Parsing never fails: anything that is not the requested shape
    /// comes back as a degraded raw-text suggestion.
    #[test]
    fn parse_always_produces_a_result(text in ".*") {
        let parsed = parse_command_analysis(&text);
        if serde_json::from_str::<serde_json::Value>(strip_code_fence(&text)).is_err() {
            prop_assert_eq!(parsed.suggestion, text);
            prop_assert_eq!(parsed.confidence, DEGRADED_CONFIDENCE);
        }
    }
}
