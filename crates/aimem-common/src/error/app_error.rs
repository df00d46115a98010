//! Application error types
//!
//! Unified error handling at the edges of the client (CLI, embedding UI).

use aimem_core::DomainError;
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Channel errors
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Not connected")]
    NotConnected,

    // Authentication errors
    #[error("Authentication failed: {0}")]
    Auth(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get a stable error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_FAILED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Auth(_) => "AUTH_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the user can fix this by retrying (reconnect, re-login)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::NotConnected => true,
            Self::Domain(e) => matches!(e, DomainError::Backend(_)),
            _ => false,
        }
    }

    /// Human-readable message for a status line
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(msg) => format!("Connection failed: {msg}. Use reconnect to retry."),
            Self::NotConnected => "Not connected to the sync server.".to_string(),
            Self::Internal(_) => "Something went wrong.".to_string(),
            other => other.to_string(),
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Serializable error report for UIs and logs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
