//! Cache keys
//!
//! A key is a collection tag plus either an entity id or a named listing query.

use aimem_core::ThoughtId;
use std::fmt;

/// Collection tag shared by all keys of one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Thought documents and thought listings
    Thoughts,
    /// Team metadata
    Teams,
    /// Aggregate counters shown on the dashboard
    SystemStats,
    /// Any other resource a view chooses to cache
    Other(String),
}

impl Collection {
    /// Get the tag string of this collection
    pub fn as_str(&self) -> &str {
        match self {
            Self::Thoughts => "thoughts",
            Self::Teams => "teams",
            Self::SystemStats => "system-stats",
            Self::Other(name) => name,
        }
    }

    /// Parse a collection tag
    pub fn parse(tag: &str) -> Self {
        match tag {
            "thoughts" => Self::Thoughts,
            "teams" => Self::Teams,
            "system-stats" => Self::SystemStats,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a key addresses inside its collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A single entity by id
    Entity(String),
    /// A listing or aggregate query by name (`"all"`, `"*"`, `"team=dev"`)
    Query(String),
}

/// Key of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub collection: Collection,
    pub scope: Scope,
}

impl CacheKey {
    /// Key of a single entity
    pub fn entity(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            scope: Scope::Entity(id.into()),
        }
    }

    /// Key of a listing or aggregate query
    pub fn query(collection: Collection, name: impl Into<String>) -> Self {
        Self {
            collection,
            scope: Scope::Query(name.into()),
        }
    }

    /// Key of a thought document
    pub fn thought(id: &ThoughtId) -> Self {
        Self::entity(Collection::Thoughts, id.as_str())
    }

    /// Key of the workspace-wide statistics aggregate
    pub fn system_stats() -> Self {
        Self::query(Collection::SystemStats, "*")
    }

    /// Check if this key addresses a listing/aggregate rather than an entity
    pub fn is_query(&self) -> bool {
        matches!(self.scope, Scope::Query(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Entity(id) => write!(f, "{}/{id}", self.collection),
            Scope::Query(name) => write!(f, "{}?{name}", self.collection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_tags() {
        assert_eq!(Collection::SystemStats.as_str(), "system-stats");
        assert_eq!(Collection::parse("thoughts"), Collection::Thoughts);
        assert_eq!(
            Collection::parse("drafts"),
            Collection::Other("drafts".to_string())
        );
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::entity(Collection::Thoughts, "42").to_string(), "thoughts/42");
        assert_eq!(CacheKey::system_stats().to_string(), "system-stats?*");
    }

    #[test]
    fn test_entity_and_query_keys_differ() {
        let entity = CacheKey::entity(Collection::Teams, "all");
        let query = CacheKey::query(Collection::Teams, "all");
        assert_ne!(entity, query);
        assert!(query.is_query());
        assert!(!entity.is_query());
    }

    #[test]
    fn test_thought_key() {
        let id = ThoughtId::parse("9").unwrap();
        assert_eq!(CacheKey::thought(&id), CacheKey::entity(Collection::Thoughts, "9"));
    }
}
