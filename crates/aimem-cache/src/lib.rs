//! # aimem-cache
//!
//! Client-side state shared between the sync channel and the views.
//!
//! ## Features
//!
//! - **Query cache**: keyed read-through cache of server representations with
//!   per-collection staleness watermarks, tombstones, and change notifications
//! - **Presence**: the set of users currently joined to a workspace
//!
//! ## Example
//!
//! ```ignore
//! use aimem_cache::{create_shared_cache, CacheKey, CacheRead, Collection};
//!
//! let cache = create_shared_cache();
//! let thought = CacheKey::entity(Collection::Thoughts, "42");
//! let listing = CacheKey::query(Collection::Thoughts, "all");
//!
//! cache.replace(thought.clone(), serde_json::json!({"id": "42", "title": "A"}));
//! cache.replace(listing.clone(), serde_json::json!([{"id": "42"}]));
//! cache.invalidate(Collection::Thoughts);
//!
//! assert!(cache.read(&thought).is_fresh());
//! assert!(matches!(cache.read(&listing), CacheRead::Stale(_)));
//! ```

pub mod presence;
pub mod query;

// Re-export query cache types
pub use query::{
    create_shared_cache, CacheError, CacheEvent, CacheKey, CacheRead, CacheResult, Collection,
    QueryCache, Scope, SharedQueryCache,
};

// Re-export presence types
pub use presence::PresenceTracker;
