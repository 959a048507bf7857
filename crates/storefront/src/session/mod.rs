//! Authenticated session store with durable, versioned persistence.
//!
//! [`AuthStore`] is the reactive container for the visitor's identity state.
//! It is loaded from the durable envelope at startup (degrading to defaults
//! on any persistence problem) and written back after every mutation. The
//! store itself never talks to the identity backend; pushed identity events
//! reach it through [`crate::services::auth`].

pub mod persist;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, warn};

use persist::{PersistedEnvelope, SessionStorage};

/// The signed-in visitor's identity, as reported by the auth backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// The session state projected from identity events and persisted across
/// restarts.
///
/// Invariants: `is_authenticated == user.is_some()`, maintained by the store
/// mutators; `is_auth_initialized` is monotonic within a process lifetime and
/// set once the first authentication check completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSessionState {
    pub is_authenticated: bool,
    pub is_auth_initialized: bool,
    pub user: Option<UserSession>,
}

/// Reactive session store.
///
/// Mutations are synchronous and atomic with respect to subscribers, like
/// [`crate::cart::CartStore`]. Every effective mutation writes the full
/// versioned envelope back to durable storage; persistence failures are
/// logged and never surfaced to callers.
pub struct AuthStore {
    tx: watch::Sender<AuthSessionState>,
    storage: Arc<dyn SessionStorage>,
}

impl AuthStore {
    /// Load the session from durable storage.
    ///
    /// A missing, empty, or corrupt envelope degrades to the default state
    /// (signed out, not yet initialized) rather than failing.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = match storage.load() {
            Ok(Some(raw)) => match PersistedEnvelope::decode(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable session envelope");
                    AuthSessionState::default()
                }
            },
            Ok(None) => AuthSessionState::default(),
            Err(e) => {
                warn!(error = %e, "session storage unreadable, starting signed out");
                AuthSessionState::default()
            }
        };

        let (tx, _rx) = watch::channel(initial);
        Self { tx, storage }
    }

    /// Subscribe to session snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSessionState> {
        self.tx.subscribe()
    }

    /// The current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthSessionState {
        self.tx.borrow().clone()
    }

    /// Whether the visitor is currently signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated
    }

    /// Set (or clear) the signed-in user. Leaves `is_auth_initialized`
    /// untouched.
    pub fn set_user(&self, user: Option<UserSession>) {
        self.mutate(|state| {
            state.is_authenticated = user.is_some();
            state.user = user;
        });
    }

    /// Sign the visitor out. Leaves `is_auth_initialized` untouched.
    pub fn logout(&self) {
        self.mutate(|state| {
            state.is_authenticated = false;
            state.user = None;
        });
    }

    /// Mark the first authentication check as complete. Idempotent: calling
    /// again has no observable effect.
    pub fn set_auth_initialized(&self) {
        let changed = self.tx.send_if_modified(|state| {
            if state.is_auth_initialized {
                return false;
            }
            state.is_auth_initialized = true;
            true
        });
        if changed {
            self.persist();
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut AuthSessionState)) {
        self.tx.send_modify(f);
        self.persist();
    }

    fn persist(&self) {
        let state = self.tx.borrow().clone();
        match PersistedEnvelope::encode(&state) {
            Ok(raw) => {
                if let Err(e) = self.storage.store(&raw) {
                    error!(error = %e, "failed to persist session envelope");
                }
            }
            Err(e) => error!(error = %e, "failed to serialize session envelope"),
        }
    }
}
