//! Envelope and normalized result types.
//!
//! Providers answer in different shapes; everything the dispatcher
//! hands back to callers goes through the types here. Structured
//! parsing degrades rather than fails: when the model's reply is not
//! the requested JSON shape, the raw text is substituted with a fixed
//! reduced confidence.

use serde::Deserialize;

// ============================================================================
// Request Envelope
// ============================================================================

/// Provider-agnostic request envelope.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub system_prompt: Option<String>,
    pub user_message: String,
    pub max_tokens: u32,
}

/// A fully built provider request, ready to send.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

// ============================================================================
// Normalized Results
// ============================================================================

/// Confidence substituted when the model returned valid JSON without a
/// confidence field.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Confidence substituted when structured parsing failed and the raw
/// text was used instead.
pub const DEGRADED_CONFIDENCE: f32 = 0.5;

/// Result of `analyze_command`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandAnalysis {
    pub suggestion: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

/// Result of `analyze_error`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDiagnosis {
    pub analysis: String,
    #[serde(default)]
    pub solutions: Vec<String>,
}

/// Result of `generate_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    pub code: String,
    pub language: String,
}

#[derive(Deserialize)]
struct GeneratedCodeWire {
    code: String,
    language: Option<String>,
}

// ============================================================================
// Broadcast Events
// ============================================================================

/// Events fanned out to every subscriber, decoupled from per-call
/// results. Delivered in order on each subscriber's channel.
#[derive(Debug, Clone)]
pub enum AiEvent {
    SuggestionReceived {
        suggestion: String,
        confidence: f32,
    },
    ErrorAnalyzed {
        error: String,
        analysis: String,
        solutions: Vec<String>,
    },
    CodeGenerated {
        code: String,
        language: String,
    },
    ConnectionStatusChanged(bool),
    AuthenticationRequired,
}

// ============================================================================
// Structured Parsing
// ============================================================================

/// Remove markdown code fences (```json / ```) wrapping a payload.
///
/// Models wrap JSON in fences despite instructions not to. Stripping
/// runs to a fixed point, so the function is idempotent.
pub fn strip_code_fence(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let mut next = current;
        if let Some(rest) = next.strip_prefix("```json") {
            next = rest;
        } else if let Some(rest) = next.strip_prefix("```") {
            next = rest;
        }
        if let Some(rest) = next.strip_suffix("```") {
            next = rest;
        }
        next = next.trim();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Parse an analysis reply, degrading to raw text on shape mismatch.
pub fn parse_command_analysis(raw: &str) -> CommandAnalysis {
    match serde_json::from_str(strip_code_fence(raw)) {
        Ok(analysis) => analysis,
        Err(_) => CommandAnalysis {
            suggestion: raw.to_string(),
            confidence: DEGRADED_CONFIDENCE,
        },
    }
}

/// Parse a diagnosis reply, degrading to raw analysis with no solutions.
pub fn parse_error_diagnosis(raw: &str) -> ErrorDiagnosis {
    match serde_json::from_str(strip_code_fence(raw)) {
        Ok(diagnosis) => diagnosis,
        Err(_) => ErrorDiagnosis {
            analysis: raw.to_string(),
            solutions: Vec::new(),
        },
    }
}

/// Parse a code reply, degrading to raw text tagged with the language
/// the caller asked for.
pub fn parse_generated_code(raw: &str, requested_language: &str) -> GeneratedCode {
    match serde_json::from_str::<GeneratedCodeWire>(strip_code_fence(raw)) {
        Ok(wire) => GeneratedCode {
            code: wire.code,
            language: wire
                .language
                .unwrap_or_else(|| requested_language.to_string()),
        },
        Err(_) => GeneratedCode {
            code: raw.to_string(),
            language: requested_language.to_string(),
        },
    }
}
