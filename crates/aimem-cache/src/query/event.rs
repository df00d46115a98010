//! Change notifications published by the query cache

use super::{CacheKey, Collection};

/// A committed cache mutation
///
/// Subscribers (views, the CLI) use these to decide what to re-read or refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An entry now holds a new value
    Replaced(CacheKey),
    /// An entry was deleted and tombstoned
    Removed(CacheKey),
    /// Every entry of the collection written before now is stale
    Invalidated(Collection),
    /// The whole cache was dropped
    Cleared,
}

impl CacheEvent {
    /// Check if this event concerns the given key
    pub fn affects(&self, key: &CacheKey) -> bool {
        match self {
            Self::Replaced(k) | Self::Removed(k) => k == key,
            Self::Invalidated(collection) => &key.collection == collection,
            Self::Cleared => true,
        }
    }
}
