//! Thought queries
//!
//! Read-through access to thoughts over the shared query cache, and the
//! save path that keeps the cache consistent with the server's answer.

use std::sync::Arc;

use aimem_cache::{CacheKey, Collection, SharedQueryCache};
use aimem_core::traits::DocumentStore;
use aimem_core::{DomainError, Thought, ThoughtId, ThoughtPatch};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use super::error::{ServiceError, ServiceResult};

/// Thought queries used by views
#[derive(Clone)]
pub struct ThoughtQueries {
    store: Arc<dyn DocumentStore>,
    cache: SharedQueryCache,
}

impl ThoughtQueries {
    /// Create a new ThoughtQueries
    pub fn new(store: Arc<dyn DocumentStore>, cache: SharedQueryCache) -> Self {
        Self { store, cache }
    }

    /// Get a thought, fetching it when no copy is cached or the cached one
    /// was removed
    ///
    /// A thought the store does not know is reported without being cached.
    #[instrument(skip(self), fields(thought_id = %id))]
    pub async fn thought(&self, id: &ThoughtId) -> ServiceResult<Thought> {
        let key = CacheKey::thought(id);
        let value = self.cache.get_or_fetch(&key, || self.fetch_value(id)).await?;

        match serde_json::from_value::<Thought>(value) {
            Ok(thought) => Ok(thought),
            Err(e) => {
                // Push payloads may carry only part of a document.
                warn!(error = %e, "Cached thought is incomplete, refetching");
                let thought = self.store.fetch(id).await?;
                self.cache.replace_as(key, &thought)?;
                Ok(thought)
            }
        }
    }

    /// Save changes to a thought
    ///
    /// The cached entity is replaced with the stored result; listings and
    /// stats are marked stale.
    #[instrument(skip(self, patch), fields(thought_id = %id))]
    pub async fn update_thought(&self, id: &ThoughtId, patch: ThoughtPatch) -> ServiceResult<Thought> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(DomainError::EmptyPatch.into());
        }

        let updated = self.store.update(id, &patch).await?;

        self.cache.replace_as(CacheKey::thought(id), &updated)?;
        self.cache.invalidate(Collection::Thoughts);
        self.cache.invalidate(Collection::SystemStats);

        info!(title = %updated.title, "Thought saved");

        Ok(updated)
    }

    /// Shared cache the queries read through
    pub fn cache(&self) -> &SharedQueryCache {
        &self.cache
    }

    async fn fetch_value(&self, id: &ThoughtId) -> ServiceResult<Value> {
        let thought = self.store.fetch(id).await?;
        debug!("Thought fetched from store");
        serde_json::to_value(&thought)
            .map_err(|e| ServiceError::internal(format!("Failed to encode thought {id}: {e}")))
    }
}
