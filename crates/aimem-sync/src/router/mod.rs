//! Envelope routing
//!
//! Classifies change notifications into cache and presence reconciliations.

mod reconciliation;
mod routing;

pub use reconciliation::{CacheAction, PresenceAction, Reconciliation};
pub use routing::MessageRouter;
