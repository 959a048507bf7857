//! Authentication service.
//!
//! Bridges the external redirect-based identity backend into [`AuthStore`].
//! The backend pushes identity-changed events at times of its own choosing -
//! before, during, or after any user action - so all of them funnel through a
//! single channel into one reducer, making arrival order irrelevant to the
//! final session state.

mod error;

pub use error::{AuthBackendError, AuthError};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::session::{AuthStore, UserSession};

/// A pushed identity-changed event: the current user, or `None` when signed
/// out.
pub type SessionEvent = Option<UserSession>;

/// The external identity backend collaborator.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Launch the external redirect sign-in flow. Resolution arrives later,
    /// either as a pushed session event or via
    /// [`Self::consume_redirect_result`] on the next startup.
    async fn begin_redirect_sign_in(&self) -> Result<(), AuthBackendError>;

    /// One-shot check for a sign-in completed by a redirect before this
    /// process started.
    async fn consume_redirect_result(&self) -> Result<Option<UserSession>, AuthBackendError>;

    /// The pushed identity-changed event stream. The backend fires at least
    /// one event per process lifetime, even when nobody is signed in. May
    /// only be taken once.
    fn session_events(&self) -> mpsc::UnboundedReceiver<SessionEvent>;
}

/// Authentication service.
///
/// Owns the routing of backend identity events into the session store.
pub struct AuthService {
    store: Arc<AuthStore>,
    backend: Arc<dyn AuthBackend>,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<AuthStore>, backend: Arc<dyn AuthBackend>) -> Self {
        Self { store, backend }
    }

    /// Start the external Google sign-in redirect.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the redirect cannot be launched. The
    /// session state is untouched; the visitor must re-trigger.
    #[instrument(skip(self))]
    pub async fn sign_in_with_google(&self) -> Result<(), AuthError> {
        self.backend.begin_redirect_sign_in().await.map_err(|e| {
            error!(error = %e, "failed to launch redirect sign-in");
            AuthError::from(e)
        })
    }

    /// Consume a sign-in redirect completed before startup, if any, routing
    /// the returned user into the session store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the result cannot be retrieved.
    #[instrument(skip(self))]
    pub async fn consume_redirect_result(&self) -> Result<Option<UserSession>, AuthError> {
        match self.backend.consume_redirect_result().await {
            Ok(Some(user)) => {
                debug!("redirect sign-in result found");
                self.store.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                error!(error = %e, "failed to retrieve redirect sign-in result");
                Err(e.into())
            }
        }
    }

    /// Spawn the reducer task that applies pushed identity events to the
    /// session store for the rest of the process lifetime.
    pub fn spawn_session_listener(&self) -> JoinHandle<()> {
        let mut events = self.backend.session_events();
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                apply_session_event(&store, event);
            }
            debug!("session event channel closed");
        })
    }
}

/// The single authoritative reducer for pushed identity events.
///
/// An event carrying a user without an email counts as signed out. Every
/// event completes an authentication check, so initialization is marked
/// afterwards; the store makes repeated marks a no-op.
pub(crate) fn apply_session_event(store: &AuthStore, event: SessionEvent) {
    match event {
        Some(user) if user.email.is_some() => store.set_user(Some(user)),
        _ => store.logout(),
    }
    store.set_auth_initialized();
}

/// Scripted identity backend for tests and offline development.
///
/// Constructed together with the sender half of its event channel so a test
/// can play the part of the remote identity provider.
pub struct ScriptedAuthBackend {
    redirect_result: std::sync::Mutex<Option<UserSession>>,
    events: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SessionEvent>>>,
    fail_redirect: std::sync::atomic::AtomicBool,
}

impl ScriptedAuthBackend {
    /// Create the backend and the handle used to push session events.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedSender<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self {
            redirect_result: std::sync::Mutex::new(None),
            events: std::sync::Mutex::new(Some(rx)),
            fail_redirect: std::sync::atomic::AtomicBool::new(false),
        };
        (backend, tx)
    }

    /// Stage a redirect result to be consumed on the next startup check.
    pub fn set_redirect_result(&self, user: UserSession) {
        if let Ok(mut slot) = self.redirect_result.lock() {
            *slot = Some(user);
        }
    }

    /// Arrange for the next sign-in launch to fail.
    pub fn fail_next_redirect(&self) {
        self.fail_redirect
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthBackend for ScriptedAuthBackend {
    async fn begin_redirect_sign_in(&self) -> Result<(), AuthBackendError> {
        if self
            .fail_redirect
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(AuthBackendError::Redirect("simulated failure".to_owned()));
        }
        Ok(())
    }

    async fn consume_redirect_result(&self) -> Result<Option<UserSession>, AuthBackendError> {
        Ok(self
            .redirect_result
            .lock()
            .ok()
            .and_then(|mut slot| slot.take()))
    }

    fn session_events(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }
}
