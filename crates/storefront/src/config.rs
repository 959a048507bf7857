//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOTILLERIA_BACKEND_PROJECT` - Backend project identifier
//! - `BOTILLERIA_BACKEND_API_KEY` - Backend API key
//!
//! ## Optional
//! - `BOTILLERIA_SESSION_FILE` - Session envelope path (default: auth-storage.json)
//! - `BOTILLERIA_CATALOG_FILE` - Catalog dataset path

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Path of the durable session envelope (the local-storage analog).
    pub session_file: PathBuf,
    /// Path of the static catalog dataset, when loaded from disk.
    pub catalog_file: Option<PathBuf>,
    /// Remote backend configuration.
    pub backend: BackendConfig,
}

/// Remote backend (auth + orders) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Backend project identifier.
    pub project: String,
    /// Backend API key.
    pub api_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("project", &self.project)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let session_file =
            PathBuf::from(get_env_or_default("BOTILLERIA_SESSION_FILE", "auth-storage.json"));
        let catalog_file = get_optional_env("BOTILLERIA_CATALOG_FILE").map(PathBuf::from);
        let backend = BackendConfig::from_env()?;

        Ok(Self {
            session_file,
            catalog_file,
            backend,
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project: get_required_env("BOTILLERIA_BACKEND_PROJECT")?,
            api_key: SecretString::from(get_required_env("BOTILLERIA_BACKEND_API_KEY")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
