//! Authentication error types.

use thiserror::Error;

/// Errors reported by the external identity backend.
#[derive(Debug, Error)]
pub enum AuthBackendError {
    /// Launching the redirect sign-in flow failed.
    #[error("redirect sign-in failed: {0}")]
    Redirect(String),

    /// The pending redirect result could not be retrieved.
    #[error("redirect result unavailable: {0}")]
    RedirectResult(String),
}

/// Errors that can occur during authentication operations.
///
/// All variants are transient: they surface to the visitor and are never
/// auto-retried, and they never touch the local session state.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity backend failed.
    #[error("auth backend error: {0}")]
    Backend(#[from] AuthBackendError),
}
