//! Storage backends for credential stores.
//!
//! A named store is one small document of typed key/value entries. The
//! keyring backend keeps the whole document as a single JSON payload in
//! the OS credential store (Keychain, Secret Service, Credential
//! Manager), so values are encrypted at rest by the platform. The file
//! backend is the unencrypted fallback, protected only by filesystem
//! permissions. The memory backend always works and is the test
//! substitute of choice.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base service name used for keyring entries.
pub(crate) const SERVICE_NAME: &str = "termai";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store verification failed: {0}")]
    Verification(String),
}

// ============================================================================
// Values
// ============================================================================

/// A typed entry value. Migration copies entries as-is, so the original
/// type survives the transfer with no lossy coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreValue {
    Str(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Bool(bool),
}

impl StoreValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoreValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        StoreValue::Str(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        StoreValue::Str(value)
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        StoreValue::Bool(value)
    }
}

/// The full contents of one named store.
pub type StoreMap = BTreeMap<String, StoreValue>;

// ============================================================================
// Backend Trait
// ============================================================================

/// Which kind of backend a store handle ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OS keychain, values encrypted at rest.
    Keyring,
    /// Sandboxed JSON file, unencrypted.
    File,
    /// Process-local, lost on exit.
    Memory,
}

/// A whole-document key/value backend.
///
/// Reads always hit the underlying storage so that external changes are
/// observed without re-opening the handle. Writes replace the whole
/// document and persist before returning.
pub trait StoreBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn read_all(&self) -> Result<StoreMap, StoreError>;

    fn write_all(&self, map: &StoreMap) -> Result<(), StoreError>;
}

// ============================================================================
// Keyring Backend
// ============================================================================

/// Keyring-backed store: one entry per store name, holding the whole
/// document as JSON.
pub struct KeyringBackend {
    service: String,
    account: String,
}

impl KeyringBackend {
    /// Open and verify a keyring-backed store.
    ///
    /// Verification performs a read-after-write round trip of the
    /// current document. A handle is only returned when the round trip
    /// succeeds; any failure (no keyring daemon, corrupted key
    /// material, platform refusal) surfaces as an error so the caller
    /// can fall back.
    pub fn open(name: &str) -> Result<Self, StoreError> {
        let backend = Self {
            service: SERVICE_NAME.to_string(),
            account: name.to_string(),
        };
        backend.verify()?;
        Ok(backend)
    }

    /// Non-mutating availability probe for diagnostics.
    pub fn is_accessible(name: &str) -> bool {
        match Entry::new(SERVICE_NAME, name) {
            Ok(entry) => match entry.get_password() {
                Ok(_) => true,
                Err(keyring::Error::NoEntry) => true,
                Err(keyring::Error::NoStorageAccess(_)) => false,
                Err(keyring::Error::PlatformFailure(_)) => false,
                // Other errors might be transient
                Err(_) => true,
            },
            Err(_) => false,
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, &self.account)?)
    }

    fn verify(&self) -> Result<(), StoreError> {
        let map = self.read_all()?;
        self.write_all(&map)?;
        let reread = self.read_all()?;
        if reread != map {
            return Err(StoreError::Verification(
                "read-after-write round trip mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

impl StoreBackend for KeyringBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Keyring
    }

    fn read_all(&self) -> Result<StoreMap, StoreError> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(keyring::Error::NoEntry) => Ok(StoreMap::new()),
            Err(e) => Err(StoreError::Keyring(e)),
        }
    }

    fn write_all(&self, map: &StoreMap) -> Result<(), StoreError> {
        let entry = self.entry()?;
        let json = serde_json::to_string(map)?;
        entry.set_password(&json)?;
        Ok(())
    }
}

// ============================================================================
// File Backend
// ============================================================================

/// Unencrypted JSON file store, used as the fallback when the keyring
/// is unavailable and as the format of pre-migration legacy stores.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Open a file-backed store, verifying the location is writable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let backend = Self { path: path.into() };
        if let Some(parent) = backend.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Round-trip the current content once so a read-only location
        // fails here instead of on the first setter.
        let map = backend.read_all()?;
        backend.write_all(&map)?;
        Ok(backend)
    }

    /// Open without the writability check. Used for legacy stores that
    /// must not be touched unless migration actually commits.
    pub fn open_readonly_ok(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn read_all(&self) -> Result<StoreMap, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write_all(&self, map: &StoreMap) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map)?;
        // Write-then-rename so readers never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ============================================================================
// Memory Backend
// ============================================================================

/// In-memory store. Always works; the last-resort backend and the test
/// double.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<StoreMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn read_all(&self) -> Result<StoreMap, StoreError> {
        Ok(self.map.lock().expect("store mutex poisoned").clone())
    }

    fn write_all(&self, map: &StoreMap) -> Result<(), StoreError> {
        *self.map.lock().expect("store mutex poisoned") = map.clone();
        Ok(())
    }
}
