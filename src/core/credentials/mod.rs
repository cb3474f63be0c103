//! Secure Credential Storage
//!
//! Stores provider API keys and client settings in the system keychain,
//! with a deterministic fallback to a sandboxed unencrypted file when
//! the keychain is unavailable, and a one-time migration path from the
//! legacy plaintext settings file.
//!
//! Opening a store never fails: a broken security subsystem downgrades
//! to a logged warning plus a working (less secure) backend, not a
//! crash.

mod backend;

pub use backend::{
    BackendKind, FileBackend, KeyringBackend, MemoryBackend, StoreBackend, StoreError,
    StoreMap, StoreValue,
};

use std::path::{Path, PathBuf};

use crate::core::llm::providers::Provider;

/// Store name used for current credentials.
pub const DEFAULT_STORE: &str = "termai_credentials";
/// Store name of the legacy plaintext settings file.
pub const LEGACY_STORE: &str = "termai_prefs";

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

pub const KEY_CLAUDE_API_KEY: &str = "claude_api_key";
pub const KEY_GEMINI_API_KEY: &str = "gemini_api_key";
pub const KEY_AI_PROVIDER: &str = "ai_provider";
pub const KEY_CLAUDE_MODEL: &str = "claude_model";
pub const KEY_LAST_WORKING_DIR: &str = "last_working_dir";
pub const KEY_LAST_COMMAND: &str = "last_command";
pub const KEY_FILTERING_ENABLED: &str = "command_filtering_enabled";

// ============================================================================
// Credential Record
// ============================================================================

/// Snapshot of everything the dispatcher needs for one operation.
///
/// Loaded fresh before every request so external credential changes
/// take effect without restarting the host application.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub provider: Provider,
    pub claude_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub claude_model: String,
    pub last_working_dir: Option<String>,
    pub last_command: Option<String>,
    pub filtering_enabled: bool,
}

impl Default for CredentialRecord {
    fn default() -> Self {
        Self {
            provider: Provider::Claude,
            claude_api_key: None,
            gemini_api_key: None,
            claude_model: DEFAULT_CLAUDE_MODEL.to_string(),
            last_working_dir: None,
            last_command: None,
            filtering_enabled: true,
        }
    }
}

impl CredentialRecord {
    /// The key for the currently selected provider, if set and non-empty.
    pub fn active_api_key(&self) -> Option<&str> {
        let key = match self.provider {
            Provider::Claude => self.claude_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        };
        key.filter(|k| !k.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.active_api_key().is_some()
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// Handle to one named credential store.
///
/// Backend selection happens once at open time; reads and writes always
/// go through to the selected backend so concurrent readers observe the
/// latest value after any setter returns.
pub struct CredentialStore {
    backend: Box<dyn StoreBackend>,
}

impl CredentialStore {
    /// Open the named store in the default data directory.
    pub fn open(name: &str) -> Self {
        Self::open_in(&default_data_dir(), name)
    }

    /// Open the named store, placing any fallback file under `data_dir`.
    ///
    /// Tries the OS keychain first and verifies it with a
    /// read-after-write round trip. Any failure falls back to an
    /// unencrypted file store named `{name}_fallback.json`, and if even
    /// that location is unusable, to an in-memory store. Never panics,
    /// never returns an error.
    pub fn open_in(data_dir: &Path, name: &str) -> Self {
        match KeyringBackend::open(name) {
            Ok(backend) => {
                tracing::debug!(store = name, "keyring-backed credential store opened");
                return Self { backend: Box::new(backend) };
            }
            Err(e) => {
                tracing::warn!(
                    store = name,
                    error = %e,
                    "keychain unavailable, falling back to unencrypted file store"
                );
            }
        }

        match FileBackend::open(fallback_path(data_dir, name)) {
            Ok(backend) => Self { backend: Box::new(backend) },
            Err(e) => {
                tracing::warn!(
                    store = name,
                    error = %e,
                    "file store unusable, credentials will not persist"
                );
                Self { backend: Box::new(MemoryBackend::new()) }
            }
        }
    }

    /// Construct over an explicit backend. The seam tests use to
    /// substitute a fake without touching keychain or disk.
    pub fn with_backend(backend: Box<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Which backend this handle ended up with.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Non-mutating probe of the encrypted backend for diagnostics.
    pub fn is_accessible(name: &str) -> bool {
        KeyringBackend::is_accessible(name)
    }

    // ========================================================================
    // Migration
    // ========================================================================

    /// Migrate the legacy plaintext store into the current store, using
    /// the default data directory.
    pub fn migrate(legacy_name: &str, current_name: &str) -> bool {
        Self::migrate_in(&default_data_dir(), legacy_name, current_name)
    }

    /// One-shot legacy-to-current migration.
    ///
    /// Returns `false` immediately, before any I/O, when the two names
    /// are equal. An empty legacy store reports `true` without writing
    /// anything. Otherwise every entry is copied preserving its value
    /// type, committed in one write, and only on commit success is the
    /// legacy store cleared. Any failure returns `false` and leaves
    /// both stores intact; no panic crosses this boundary.
    pub fn migrate_in(data_dir: &Path, legacy_name: &str, current_name: &str) -> bool {
        if legacy_name == current_name {
            tracing::warn!(
                store = legacy_name,
                "migration source and destination share a name, skipping"
            );
            return false;
        }

        let legacy = FileBackend::open_readonly_ok(legacy_path(data_dir, legacy_name));
        let entries = match legacy.read_all() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(store = legacy_name, error = %e, "cannot read legacy store");
                return false;
            }
        };
        if entries.is_empty() {
            return true;
        }

        let current = Self::open_in(data_dir, current_name);
        Self::migrate_entries(entries, &legacy, &current)
    }

    /// Copy `entries` into `current` and clear `legacy` on commit
    /// success. Split out so tests can drive it with fake backends.
    pub(crate) fn migrate_entries(
        entries: StoreMap,
        legacy: &dyn StoreBackend,
        current: &CredentialStore,
    ) -> bool {
        let count = entries.len();

        let mut merged = match current.backend.read_all() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read destination store, migration aborted");
                return false;
            }
        };
        merged.extend(entries);

        if let Err(e) = current.backend.write_all(&merged) {
            tracing::warn!(error = %e, "migration commit failed, legacy store preserved");
            return false;
        }

        if let Err(e) = legacy.write_all(&StoreMap::new()) {
            tracing::warn!(error = %e, "migrated but could not clear legacy store");
        } else {
            tracing::info!(entries = count, "legacy credentials migrated and cleared");
        }
        true
    }

    // ========================================================================
    // Typed Accessors
    // ========================================================================

    /// Read one entry. Backend read errors degrade to `None` with a
    /// warning; settings lookups must not take the client down.
    pub fn get(&self, key: &str) -> Option<StoreValue> {
        match self.backend.read_all() {
            Ok(map) => map.get(key).cloned(),
            Err(e) => {
                tracing::warn!(key, error = %e, "credential store read failed");
                None
            }
        }
    }

    /// Write one entry and persist before returning.
    pub fn set(&self, key: &str, value: impl Into<StoreValue>) -> Result<(), StoreError> {
        let mut map = self.backend.read_all()?;
        map.insert(key.to_string(), value.into());
        self.backend.write_all(&map)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    // ========================================================================
    // Domain Accessors
    // ========================================================================

    /// Snapshot the full record in one backend read.
    pub fn load(&self) -> CredentialRecord {
        let map = match self.backend.read_all() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "credential store read failed, using defaults");
                StoreMap::new()
            }
        };

        let string = |key: &str| -> Option<String> {
            map.get(key).and_then(|v| v.as_str().map(str::to_string))
        };

        let provider = match string(KEY_AI_PROVIDER) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "unrecognized stored provider, defaulting");
                Provider::Claude
            }),
            None => Provider::Claude,
        };

        CredentialRecord {
            provider,
            claude_api_key: string(KEY_CLAUDE_API_KEY),
            gemini_api_key: string(KEY_GEMINI_API_KEY),
            claude_model: string(KEY_CLAUDE_MODEL)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
            last_working_dir: string(KEY_LAST_WORKING_DIR),
            last_command: string(KEY_LAST_COMMAND),
            filtering_enabled: map
                .get(KEY_FILTERING_ENABLED)
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
        }
    }

    pub fn api_key(&self, provider: Provider) -> Option<String> {
        let key = match provider {
            Provider::Claude => KEY_CLAUDE_API_KEY,
            Provider::Gemini => KEY_GEMINI_API_KEY,
        };
        self.get_string(key).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&self, provider: Provider, key: &str) -> Result<(), StoreError> {
        let field = match provider {
            Provider::Claude => KEY_CLAUDE_API_KEY,
            Provider::Gemini => KEY_GEMINI_API_KEY,
        };
        self.set(field, key)
    }

    /// Invalidate a key after an authentication failure: set empty and
    /// persist, so `is_authenticated()` flips immediately.
    pub fn clear_api_key(&self, provider: Provider) -> Result<(), StoreError> {
        self.set_api_key(provider, "")
    }

    pub fn provider(&self) -> Provider {
        self.load().provider
    }

    pub fn set_provider(&self, provider: Provider) -> Result<(), StoreError> {
        self.set(KEY_AI_PROVIDER, provider.to_string())
    }

    pub fn claude_model(&self) -> String {
        self.load().claude_model
    }

    pub fn set_claude_model(&self, model: &str) -> Result<(), StoreError> {
        self.set(KEY_CLAUDE_MODEL, model)
    }

    pub fn filtering_enabled(&self) -> bool {
        self.load().filtering_enabled
    }

    pub fn set_filtering_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.set(KEY_FILTERING_ENABLED, enabled)
    }

    /// Persist the most recent terminal context in one write.
    pub fn set_context(&self, working_dir: &str, command: &str) -> Result<(), StoreError> {
        let mut map = self.backend.read_all()?;
        map.insert(KEY_LAST_WORKING_DIR.to_string(), working_dir.into());
        map.insert(KEY_LAST_COMMAND.to_string(), command.into());
        self.backend.write_all(&map)
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_authenticated()
    }
}

// ============================================================================
// Paths
// ============================================================================

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("termai"))
        .unwrap_or_else(|| PathBuf::from(".termai"))
}

fn fallback_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}_fallback.json"))
}

fn legacy_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.json"))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Mask an API key for display (show first 4 and last 4 chars).
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        return "********".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

/// Shallow format check for a provider's API keys. Does not verify the
/// key against the provider.
pub fn validate_api_key_format(provider: Provider, key: &str) -> bool {
    let trimmed = key.trim();
    match provider {
        Provider::Claude => trimmed.starts_with("sk-ant-"),
        Provider::Gemini => trimmed.starts_with("AIza"),
    }
}
