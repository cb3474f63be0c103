//! Request Dispatcher
//!
//! `AiClient` owns the active-provider selection and the three
//! high-level operations. Every operation follows the same template:
//! reload credentials, run the text through the privacy filter,
//! short-circuit when unauthenticated, delegate to the active
//! provider's adapter, and degrade structured parsing to raw text
//! instead of failing.
//!
//! A 401 on this path clears the stored key and broadcasts
//! `AuthenticationRequired` so the host can prompt for re-entry.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::credentials::{
    CredentialRecord, CredentialStore, StoreError, DEFAULT_STORE, LEGACY_STORE,
};
use crate::core::privacy::{PassthroughFilter, PrivacyFilter};

use super::error::{classify_status, AiError, Result};
use super::providers::{
    ClaudeAdapter, GeminiAdapter, Provider, ProviderAdapter, ANTHROPIC_API_BASE_URL,
    GEMINI_API_URL,
};
use super::types::{
    parse_command_analysis, parse_error_diagnosis, parse_generated_code, AiEvent,
    CommandAnalysis, ErrorDiagnosis, GeneratedCode, PromptRequest, WireRequest,
};

// ============================================================================
// Operation Prompts
// ============================================================================

const ANALYZE_COMMAND_SYSTEM: &str = "You are a terminal command assistant. \
    Analyze commands and provide helpful suggestions. \
    Respond ONLY with a JSON object containing 'suggestion' (string) and \
    'confidence' (float 0.0-1.0).";

const ANALYZE_ERROR_SYSTEM: &str = "You are a terminal error diagnostics assistant. \
    Analyze command errors and provide actionable solutions. \
    Respond ONLY with a JSON object containing 'analysis' (string) and \
    'solutions' (array of strings).";

const GENERATE_CODE_SYSTEM: &str = "You are a code generation assistant for a \
    terminal environment. Generate clean, well-commented code. \
    Respond ONLY with a JSON object containing 'code' (string) and \
    'language' (string).";

const ANALYZE_COMMAND_MAX_TOKENS: u32 = 512;
const ANALYZE_ERROR_MAX_TOKENS: u32 = 1024;
const GENERATE_CODE_MAX_TOKENS: u32 = 4096;

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing an `AiClient`.
pub struct AiClientBuilder {
    store: Option<CredentialStore>,
    filter: Arc<dyn PrivacyFilter>,
    config: AppConfig,
    anthropic_base_url: String,
    gemini_url: String,
}

impl AiClientBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            filter: Arc::new(PassthroughFilter),
            config: AppConfig::default(),
            anthropic_base_url: ANTHROPIC_API_BASE_URL.to_string(),
            gemini_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Use an explicitly opened store instead of the default one.
    /// Skips the legacy migration, which only applies to the default
    /// store layout.
    pub fn with_store(mut self, store: CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn PrivacyFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_anthropic_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.anthropic_base_url = base_url.into();
        self
    }

    pub fn with_gemini_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_url = url.into();
        self
    }

    pub fn build(self) -> AiClient {
        let store = self.store.unwrap_or_else(|| {
            // Default layout: migrate any pre-encryption plaintext
            // settings once, then open the current store.
            match self.config.data.data_dir.as_deref() {
                Some(dir) => {
                    CredentialStore::migrate_in(dir, LEGACY_STORE, DEFAULT_STORE);
                    CredentialStore::open_in(dir, DEFAULT_STORE)
                }
                None => {
                    CredentialStore::migrate(LEGACY_STORE, DEFAULT_STORE);
                    CredentialStore::open(DEFAULT_STORE)
                }
            }
        });

        let http = reqwest::Client::builder()
            .connect_timeout(self.config.request.connect_timeout())
            .timeout(self.config.request.read_timeout())
            .build()
            .expect("Failed to create HTTP client");

        AiClient {
            store,
            http,
            filter: self.filter,
            anthropic_base_url: self.anthropic_base_url,
            gemini_url: self.gemini_url,
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl Default for AiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Dual-provider AI client for terminal applications.
pub struct AiClient {
    pub(crate) store: CredentialStore,
    pub(crate) http: reqwest::Client,
    pub(crate) filter: Arc<dyn PrivacyFilter>,
    pub(crate) anthropic_base_url: String,
    pub(crate) gemini_url: String,
    pub(crate) listeners: Mutex<Vec<mpsc::UnboundedSender<AiEvent>>>,
}

impl AiClient {
    /// Client over an explicitly opened store, with defaults everywhere
    /// else.
    pub fn new(store: CredentialStore) -> Self {
        Self::builder().with_store(store).build()
    }

    pub fn builder() -> AiClientBuilder {
        AiClientBuilder::new()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Subscribe to broadcast events. Each subscriber gets its own
    /// ordered channel; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AiEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .expect("listener mutex poisoned")
            .push(tx);
        rx
    }

    pub fn current_provider(&self) -> Provider {
        self.store.provider()
    }

    /// Switch providers. Takes effect on the next operation; an
    /// in-flight request keeps the adapter it was dispatched with.
    pub fn set_provider(&self, provider: Provider) -> std::result::Result<(), StoreError> {
        self.store.set_provider(provider)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Ask the active provider to analyze a shell command.
    pub async fn analyze_command(&self, command: &str, context: &str) -> Result<CommandAnalysis> {
        let record = self.load_credentials();
        let (command, context) = if record.filtering_enabled {
            (
                self.filter.filter_command(command),
                self.filter.filter(context),
            )
        } else {
            (command.to_string(), context.to_string())
        };

        let prompt = PromptRequest {
            system_prompt: Some(ANALYZE_COMMAND_SYSTEM.to_string()),
            user_message: format!("Analyze this command: {command}\nContext: {context}"),
            max_tokens: ANALYZE_COMMAND_MAX_TOKENS,
        };
        let text = self.dispatch(&record, prompt).await?;

        let analysis = parse_command_analysis(&text);
        self.emit(AiEvent::SuggestionReceived {
            suggestion: analysis.suggestion.clone(),
            confidence: analysis.confidence,
        });
        Ok(analysis)
    }

    /// Ask the active provider to diagnose a failed command.
    pub async fn analyze_error(
        &self,
        command: &str,
        error_output: &str,
        context: &str,
    ) -> Result<ErrorDiagnosis> {
        let record = self.load_credentials();
        let (command, error_output, context) = if record.filtering_enabled {
            (
                self.filter.filter_command(command),
                self.filter.filter(error_output),
                self.filter.filter(context),
            )
        } else {
            (
                command.to_string(),
                error_output.to_string(),
                context.to_string(),
            )
        };

        let prompt = PromptRequest {
            system_prompt: Some(ANALYZE_ERROR_SYSTEM.to_string()),
            user_message: format!(
                "Command: {command}\nError output: {error_output}\nContext: {context}"
            ),
            max_tokens: ANALYZE_ERROR_MAX_TOKENS,
        };
        let text = self.dispatch(&record, prompt).await?;

        let diagnosis = parse_error_diagnosis(&text);
        self.emit(AiEvent::ErrorAnalyzed {
            error: error_output,
            analysis: diagnosis.analysis.clone(),
            solutions: diagnosis.solutions.clone(),
        });
        Ok(diagnosis)
    }

    /// Ask the active provider to generate code from a description.
    pub async fn generate_code(
        &self,
        description: &str,
        language: &str,
        context: &str,
    ) -> Result<GeneratedCode> {
        let record = self.load_credentials();
        let (description, context) = if record.filtering_enabled {
            (self.filter.filter(description), self.filter.filter(context))
        } else {
            (description.to_string(), context.to_string())
        };

        let prompt = PromptRequest {
            system_prompt: Some(GENERATE_CODE_SYSTEM.to_string()),
            user_message: format!("Generate {language} code for: {description}\nContext: {context}"),
            max_tokens: GENERATE_CODE_MAX_TOKENS,
        };
        let text = self.dispatch(&record, prompt).await?;

        let generated = parse_generated_code(&text, language);
        self.emit(AiEvent::CodeGenerated {
            code: generated.code.clone(),
            language: generated.language.clone(),
        });
        Ok(generated)
    }

    /// Cache the latest terminal context for future prompts. Local
    /// only: this never issues a network call.
    pub fn send_context_update(
        &self,
        working_directory: &str,
        current_command: &str,
        _recent_commands: &[String],
    ) {
        if let Err(e) = self.store.set_context(working_directory, current_command) {
            tracing::warn!(error = %e, "failed to persist terminal context");
        }
    }

    // ========================================================================
    // Shared Dispatch Path
    // ========================================================================

    pub(crate) fn load_credentials(&self) -> CredentialRecord {
        self.store.load()
    }

    /// Bind the adapter for a provider. Called once per operation, so a
    /// provider switch never affects an in-flight request.
    pub(crate) fn adapter_for(&self, provider: Provider) -> Box<dyn ProviderAdapter> {
        match provider {
            Provider::Claude => {
                Box::new(ClaudeAdapter::with_base_url(self.anthropic_base_url.clone()))
            }
            Provider::Gemini => Box::new(GeminiAdapter::with_url(self.gemini_url.clone())),
        }
    }

    /// POST a built request and hand back status plus raw body.
    pub(crate) async fn send(&self, wire: &WireRequest) -> Result<(u16, String)> {
        let mut request = self.http.post(&wire.url);
        for (name, value) in &wire.headers {
            request = request.header(*name, value.as_str());
        }

        let response = match request.json(&wire.body).send().await {
            Ok(response) => response,
            Err(e) => {
                self.emit(AiEvent::ConnectionStatusChanged(false));
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    async fn dispatch(&self, record: &CredentialRecord, prompt: PromptRequest) -> Result<String> {
        let provider = record.provider;
        if !record.is_authenticated() {
            self.emit(AiEvent::AuthenticationRequired);
            return Err(AiError::NotConfigured(provider));
        }

        let adapter = self.adapter_for(provider);
        let wire = adapter.build_request(&prompt, record)?;

        tracing::debug!(%provider, url = %wire.url, "dispatching request");
        let (status, body) = self.send(&wire).await?;

        if !(200..300).contains(&status) {
            let err = classify_status(status, body);
            if matches!(err, AiError::InvalidKey) {
                // Required side effect: a rejected key is dead, drop it
                // and tell the host to ask for a new one.
                if let Err(e) = self.store.clear_api_key(provider) {
                    tracing::warn!(%provider, error = %e, "failed to clear rejected key");
                }
                self.emit(AiEvent::AuthenticationRequired);
            }
            return Err(err);
        }

        self.emit(AiEvent::ConnectionStatusChanged(true));

        let json: serde_json::Value = match serde_json::from_str(&body) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!(%provider, error = %e, "unparseable success body");
                return Err(AiError::NoContent);
            }
        };
        adapter.extract_text(&json)
    }

    pub(crate) fn emit(&self, event: AiEvent) {
        let mut listeners = self.listeners.lock().expect("listener mutex poisoned");
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
