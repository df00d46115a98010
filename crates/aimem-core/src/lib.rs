//! # aimem-core
//!
//! Domain layer containing entities, value objects, the push-channel envelope,
//! and the traits for the external collaborators (document store, auth provider).
//! This crate has zero dependencies on infrastructure (sockets, HTTP, caches).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Session, Thought, ThoughtPatch};
pub use error::DomainError;
pub use events::{Envelope, MessageType, OutgoingEnvelope};
pub use traits::{AuthProvider, DocumentStore, RepoResult};
pub use value_objects::{IdParseError, ThoughtId, UserId, WorkspaceId};
