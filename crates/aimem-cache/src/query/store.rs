//! Reconciled query cache.
//!
//! Keeps the last known server representation per key. Consistency comes from
//! explicit reconciliation (replace / remove / invalidate), never from expiry.
//!
//! Every write takes a tick from a logical clock. `invalidate` stores the
//! current tick as the collection's watermark, and a listing or aggregate
//! query whose tick is below its collection's watermark reads as stale.
//! Watermarks only grow. Entities are only ever replaced or tombstoned.

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{CacheEvent, CacheKey, Collection};

/// Buffer of the change notification channel
const EVENT_BUFFER: usize = 256;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to decode cached value for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRead<T = Value> {
    /// Written after the latest invalidation of its collection
    Fresh(T),
    /// Last known value, but must be refetched before it is trusted
    Stale(T),
    /// Deleted on the server since it was cached
    Removed,
    /// Never fetched
    Unknown,
}

impl<T> CacheRead<T> {
    /// The cached value, fresh or stale
    pub fn value(self) -> Option<T> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Some(v),
            Self::Removed | Self::Unknown => None,
        }
    }

    /// Check if the value can be served without refetching
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// Check if a read-through should hit the backend
    pub fn needs_fetch(&self) -> bool {
        !self.is_fresh()
    }

    /// Transform the value, keeping the freshness
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<CacheRead<U>, E> {
        Ok(match self {
            Self::Fresh(v) => CacheRead::Fresh(f(v)?),
            Self::Stale(v) => CacheRead::Stale(f(v)?),
            Self::Removed => CacheRead::Removed,
            Self::Unknown => CacheRead::Unknown,
        })
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    Tombstone,
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    written_at: u64,
}

/// Shared query cache
///
/// Created once at application start and handed to every sync client and view.
pub struct QueryCache {
    entries: DashMap<CacheKey, Entry>,
    watermarks: DashMap<Collection, u64>,
    clock: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

/// Shared cache handle
pub type SharedQueryCache = Arc<QueryCache>;

/// Create a new shared cache handle
#[must_use]
pub fn create_shared_cache() -> SharedQueryCache {
    Arc::new(QueryCache::new())
}

impl QueryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            entries: DashMap::new(),
            watermarks: DashMap::new(),
            clock: AtomicU64::new(0),
            events,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn watermark(&self, collection: &Collection) -> u64 {
        self.watermarks.get(collection).map_or(0, |w| *w)
    }

    /// Listings and aggregates go stale behind their collection's watermark;
    /// entities only change through `replace` and `remove`
    fn is_stale(&self, key: &CacheKey, written_at: u64) -> bool {
        key.is_query() && written_at < self.watermark(&key.collection)
    }

    fn publish(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn raise_watermark(&self, collection: &Collection, tick: u64) {
        self.watermarks
            .entry(collection.clone())
            .and_modify(|w| *w = (*w).max(tick))
            .or_insert(tick);
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Store a server representation; fresher than any earlier invalidation
    pub fn replace(&self, key: CacheKey, value: Value) {
        let written_at = self.tick();
        tracing::trace!(key = %key, tick = written_at, "Cache replace");
        self.entries.insert(
            key.clone(),
            Entry {
                slot: Slot::Value(value),
                written_at,
            },
        );
        self.publish(CacheEvent::Replaced(key));
    }

    /// Serialize and store a typed value
    pub fn replace_as<T: serde::Serialize>(&self, key: CacheKey, value: &T) -> CacheResult<()> {
        let value = serde_json::to_value(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.replace(key, value);
        Ok(())
    }

    /// Delete an entry and mark its collection's listings stale
    ///
    /// The key keeps a tombstone so later reads report `Removed`.
    pub fn remove(&self, key: &CacheKey) {
        let tick = self.tick();
        tracing::trace!(key = %key, tick, "Cache remove");
        self.entries.insert(
            key.clone(),
            Entry {
                slot: Slot::Tombstone,
                written_at: tick,
            },
        );
        self.raise_watermark(&key.collection, tick);
        self.publish(CacheEvent::Removed(key.clone()));
    }

    /// Mark the listing and aggregate queries cached so far in a collection
    /// as stale
    ///
    /// Entities of the collection are left untouched.
    pub fn invalidate(&self, collection: Collection) {
        let tick = self.tick();
        tracing::trace!(collection = %collection, tick, "Cache invalidate");
        self.raise_watermark(&collection, tick);
        self.publish(CacheEvent::Invalidated(collection));
    }

    /// Read the last committed value for a key
    pub fn read(&self, key: &CacheKey) -> CacheRead {
        let Some(entry) = self.entries.get(key) else {
            return CacheRead::Unknown;
        };
        match &entry.slot {
            Slot::Tombstone => CacheRead::Removed,
            Slot::Value(value) => {
                if self.is_stale(key, entry.written_at) {
                    CacheRead::Stale(value.clone())
                } else {
                    CacheRead::Fresh(value.clone())
                }
            }
        }
    }

    /// Read and decode a typed value
    pub fn read_as<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheResult<CacheRead<T>> {
        self.read(key).try_map(|value| {
            serde_json::from_value(value).map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })
        })
    }

    /// Read-through access
    ///
    /// Serves a fresh entry directly; otherwise awaits `fetch` and stores its
    /// result. The result is stored with the tick taken before the fetch
    /// started, so an invalidation arriving mid-fetch still marks it stale,
    /// and a push update that landed mid-fetch is not overwritten.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let CacheRead::Fresh(value) = self.read(key) {
            return Ok(value);
        }

        let started_at = self.tick();
        let value = fetch().await?;

        let committed = match self.entries.entry(key.clone()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().written_at < started_at {
                    occupied.insert(Entry {
                        slot: Slot::Value(value.clone()),
                        written_at: started_at,
                    });
                    true
                } else {
                    false
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    slot: Slot::Value(value.clone()),
                    written_at: started_at,
                });
                true
            }
        };

        if committed {
            self.publish(CacheEvent::Replaced(key.clone()));
        } else {
            tracing::debug!(key = %key, "Fetched value superseded by a newer write");
        }

        Ok(value)
    }

    /// Keys of a collection that currently read as stale
    pub fn stale_keys(&self, collection: &Collection) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|e| {
                &e.key().collection == collection
                    && matches!(e.value().slot, Slot::Value(_))
                    && self.is_stale(e.key(), e.value().written_at)
            })
            .map(|e| e.key().clone())
            .collect()
    }

    /// Check if a collection has been invalidated at least once
    pub fn is_invalidated(&self, collection: &Collection) -> bool {
        self.watermark(collection) > 0
    }

    /// Number of entries, tombstones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and watermark (application shutdown, logout)
    pub fn clear(&self) {
        self.entries.clear();
        self.watermarks.clear();
        self.publish(CacheEvent::Cleared);
        tracing::debug!("Cache cleared");
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.len())
            .field("collections", &self.watermarks.len())
            .field("clock", &self.clock.load(Ordering::SeqCst))
            .finish()
    }
}
