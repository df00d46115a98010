//! Collaborator traits (ports) - the services the sync client consumes
//!
//! The document store and the auth provider live outside this workspace.
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{Session, Thought, ThoughtPatch};
use crate::error::DomainError;
use crate::value_objects::ThoughtId;

/// Result type for collaborator operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Document Store
// ============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a thought, `DomainError::ThoughtNotFound` if absent
    async fn fetch(&self, id: &ThoughtId) -> RepoResult<Thought>;

    /// Apply a partial update, `DomainError::Validation` if the server rejects it
    async fn update(&self, id: &ThoughtId, patch: &ThoughtPatch) -> RepoResult<Thought>;
}

// ============================================================================
// Auth Provider
// ============================================================================

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Check if a usable session is present
    fn is_authenticated(&self) -> bool;

    /// Exchange an OAuth authorization code for a session
    async fn exchange_code(&self, code: &str, state: Option<&str>) -> RepoResult<Session>;
}
