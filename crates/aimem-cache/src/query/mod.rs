//! Query cache module.
//!
//! Holds the last known server representation of entities and listings.

mod event;
mod key;
mod store;

pub use event::CacheEvent;
pub use key::{CacheKey, Collection, Scope};
pub use store::{
    create_shared_cache, CacheError, CacheRead, CacheResult, QueryCache, SharedQueryCache,
};
