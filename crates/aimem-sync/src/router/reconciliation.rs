//! Reconciliation plans produced by the router

use aimem_cache::{CacheKey, Collection};
use aimem_core::UserId;
use serde_json::Value;

/// One cache mutation
#[derive(Debug, Clone, PartialEq)]
pub enum CacheAction {
    /// Store the server's representation of an entity
    Replace { key: CacheKey, value: Value },
    /// Tombstone an entity
    Remove(CacheKey),
    /// Mark everything in a collection stale
    Invalidate(Collection),
}

/// One presence mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceAction {
    Join(UserId),
    Leave(UserId),
}

/// What an envelope means for local state
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Cache mutations, applied in order
    Cache(Vec<CacheAction>),
    /// Presence mutation
    Presence(PresenceAction),
    /// Nothing to do (unknown envelope type)
    Ignore,
}

impl Reconciliation {
    /// Check if applying this changes nothing
    #[must_use]
    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignore)
    }
}
