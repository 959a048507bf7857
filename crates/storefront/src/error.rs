//! Unified error handling for the storefront core.
//!
//! Provides a unified `AppError` type plus the single place where internal
//! errors are translated into visitor-facing messages. Internal details stay
//! in the logs; the presentation layer only ever sees the translated text.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order submission failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog dataset failed to load.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl AppError {
    /// The message shown to the visitor for this error.
    ///
    /// Remote failures invite a retry; startup failures ask the visitor to
    /// come back later. None of them expose internal details.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Auth(_) => {
                "Error al iniciar sesión con Google. Por favor, intenta nuevamente."
            }
            Self::Checkout(_) => {
                "Hubo un error al procesar tu orden. Por favor, intenta nuevamente."
            }
            Self::Config(_) | Self::Catalog(_) => {
                "La tienda no está disponible en este momento. Por favor, intenta más tarde."
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderBackendError;
    use crate::services::auth::AuthBackendError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::MissingEnvVar(
            "BOTILLERIA_BACKEND_PROJECT".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Config error: Missing environment variable: BOTILLERIA_BACKEND_PROJECT"
        );
    }

    #[test]
    fn test_user_messages_hide_internal_details() {
        let checkout: AppError =
            CheckoutError::Backend(OrderBackendError::Unavailable("socket reset".into())).into();
        assert_eq!(
            checkout.user_message(),
            "Hubo un error al procesar tu orden. Por favor, intenta nuevamente."
        );
        assert!(!checkout.user_message().contains("socket"));

        let auth: AppError =
            AuthError::Backend(AuthBackendError::Redirect("dns failure".into())).into();
        assert_eq!(
            auth.user_message(),
            "Error al iniciar sesión con Google. Por favor, intenta nuevamente."
        );
    }
}
