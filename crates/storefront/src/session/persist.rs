//! Durable session envelope, schema versioning, and migrations.
//!
//! The auth session is persisted as a versioned JSON envelope
//! `{"version": N, "state": {...}}` in a single key-value slot. On load, a
//! stored version older than [`CURRENT_VERSION`] is upgraded through a linear
//! chain of pure transforms, one per version step. `CURRENT_VERSION` is the
//! single source of truth for the schema version; bump it and append a
//! migration arm together.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::AuthSessionState;

/// Current schema version of the persisted session state.
pub const CURRENT_VERSION: u32 = 1;

/// Errors from the durable key-value slot itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors decoding a persisted envelope.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),
    #[error("persisted version {0} is newer than supported version {CURRENT_VERSION}")]
    UnsupportedVersion(u32),
}

/// The versioned wrapper around persisted session state.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    pub version: u32,
    pub state: Value,
}

impl PersistedEnvelope {
    /// Serialize a session state under the current version.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be represented as JSON.
    pub fn encode(state: &AuthSessionState) -> Result<String, serde_json::Error> {
        let envelope = Self {
            version: CURRENT_VERSION,
            state: serde_json::to_value(state)?,
        };
        serde_json::to_string(&envelope)
    }

    /// Parse a raw envelope and migrate its state up to the current version.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or a version newer than this build
    /// supports. Callers degrade to the default state on any error.
    pub fn decode(raw: &str) -> Result<AuthSessionState, PersistenceError> {
        let envelope: Self = serde_json::from_str(raw)?;

        if envelope.version > CURRENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(envelope.version));
        }

        let mut state = envelope.state;
        let mut version = envelope.version;
        while version < CURRENT_VERSION {
            state = migrate_step(state, version);
            version += 1;
        }

        Ok(serde_json::from_value(state)?)
    }
}

/// One migration step: a pure transform from `version` to `version + 1`.
///
/// Migrations only add or transform fields; they never drop a field the new
/// schema still has.
fn migrate_step(state: Value, version: u32) -> Value {
    match version {
        0 => migrate_v0_to_v1(state),
        // Exhaustive by construction: decode() only walks versions below
        // CURRENT_VERSION.
        _ => state,
    }
}

/// v0 → v1: the schema gained `isAuthInitialized`; stored sessions predate
/// the flag and have not run an auth check yet.
fn migrate_v0_to_v1(mut state: Value) -> Value {
    if let Some(object) = state.as_object_mut() {
        object.insert("isAuthInitialized".to_owned(), Value::Bool(false));
    }
    state
}

/// The durable key-value slot holding the session envelope.
///
/// Read once on startup, written after every session mutation.
pub trait SessionStorage: Send + Sync {
    /// Load the raw envelope, `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    fn store(&self, raw: &str) -> Result<(), StorageError>;
}

/// File-backed session storage: one JSON file per profile.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, raw: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory session storage for tests and ephemeral profiles.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    slot: Mutex<Option<String>>,
}

impl InMemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with a raw envelope.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// The currently stored raw envelope, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().map(|slot| slot.clone()).unwrap_or(None)
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.raw())
    }

    fn store(&self, raw: &str) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(raw.to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::UserSession;

    #[test]
    fn test_v0_envelope_migrates_without_data_loss() {
        let raw = r#"{
            "version": 0,
            "state": {
                "isAuthenticated": true,
                "user": {
                    "email": "a@b.com",
                    "displayName": "Ana",
                    "photoURL": "https://example.com/ana.png"
                }
            }
        }"#;

        let state = PersistedEnvelope::decode(raw).unwrap();
        assert!(state.is_authenticated);
        assert!(!state.is_auth_initialized);

        let user = state.user.unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
        assert_eq!(user.photo_url.as_deref(), Some("https://example.com/ana.png"));
    }

    #[test]
    fn test_current_version_round_trip() {
        let state = AuthSessionState {
            is_authenticated: true,
            is_auth_initialized: true,
            user: Some(UserSession {
                email: Some("a@b.com".to_owned()),
                display_name: None,
                photo_url: None,
            }),
        };

        let raw = PersistedEnvelope::encode(&state).unwrap();
        let decoded = PersistedEnvelope::decode(&raw).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_encode_uses_camel_case_wire_format() {
        let state = AuthSessionState {
            is_authenticated: false,
            is_auth_initialized: true,
            user: None,
        };

        let raw = PersistedEnvelope::encode(&state).unwrap();
        assert!(raw.contains("\"isAuthenticated\":false"));
        assert!(raw.contains("\"isAuthInitialized\":true"));
        assert!(raw.contains(&format!("\"version\":{CURRENT_VERSION}")));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let raw = format!(
            r#"{{"version": {}, "state": {{}}}}"#,
            CURRENT_VERSION + 1
        );
        assert!(matches!(
            PersistedEnvelope::decode(&raw),
            Err(PersistenceError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(PersistedEnvelope::decode("not json").is_err());
        assert!(PersistedEnvelope::decode("{\"version\": 1}").is_err());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("auth-storage.json"));

        assert!(storage.load().unwrap().is_none());

        storage.store("{\"version\":1}").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("{\"version\":1}"));
    }

    #[test]
    fn test_file_storage_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("profile/a/auth.json"));

        storage.store("{}").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_in_memory_storage_round_trip() {
        let storage = InMemorySessionStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.store("abc").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("abc"));
    }
}
