//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::ThoughtId;

/// Domain layer errors
///
/// Returned by the collaborator traits; the sync channel never produces these.
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Thought not found: {0}")]
    ThoughtNotFound(ThoughtId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Empty update")]
    EmptyPatch,

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Authorization code expired")]
    AuthCodeExpired,

    #[error("Authorization code rejected: {0}")]
    AuthCodeRejected(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ThoughtNotFound(_) => "UNKNOWN_THOUGHT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmptyPatch => "EMPTY_PATCH",
            Self::AuthCodeExpired => "AUTH_CODE_EXPIRED",
            Self::AuthCodeRejected(_) => "AUTH_CODE_REJECTED",
            Self::AuthFailed(_) => "AUTH_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ThoughtNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::EmptyPatch)
    }

    /// Check if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::AuthCodeExpired
                | Self::AuthCodeRejected(_)
                | Self::AuthFailed(_)
                | Self::NotAuthenticated
        )
    }

    /// Check if the authorization code can no longer be exchanged
    ///
    /// A second exchange of the same code (e.g. a double callback) fails this way.
    pub fn is_spent_code(&self) -> bool {
        matches!(self, Self::AuthCodeExpired | Self::AuthCodeRejected(_))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
