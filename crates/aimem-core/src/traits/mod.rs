//! Collaborator traits (ports)

mod collaborators;

pub use collaborators::{AuthProvider, DocumentStore, RepoResult};
