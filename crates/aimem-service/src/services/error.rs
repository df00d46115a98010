//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use aimem_cache::CacheError;
use aimem_common::AppError;
use aimem_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Collaborator failure (document store, auth provider)
    Domain(DomainError),

    /// Cached value could not be encoded or decoded
    Cache(CacheError),

    /// OAuth provider redirected back with an error
    OAuth(String),

    /// Callback arrived without an authorization code
    MissingCode,

    /// Callback already handled by this service instance
    AlreadyHandled,

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::Cache(e) => write!(f, "{e}"),
            Self::OAuth(msg) => write!(f, "OAuth error: {msg}"),
            Self::MissingCode => write!(f, "No authorization code received"),
            Self::AlreadyHandled => write!(f, "Callback already handled"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code for display and logs
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Cache(_) => "CACHE_ERROR",
            Self::OAuth(_) => "OAUTH_ERROR",
            Self::MissingCode => "MISSING_CODE",
            Self::AlreadyHandled => "ALREADY_HANDLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_not_found())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_validation())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Domain(DomainError::from(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::Cache(e) => AppError::internal(e),
            ServiceError::OAuth(msg) => AppError::Auth(msg),
            ServiceError::MissingCode => AppError::Auth("no authorization code received".to_string()),
            ServiceError::AlreadyHandled => AppError::Auth("callback already handled".to_string()),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
