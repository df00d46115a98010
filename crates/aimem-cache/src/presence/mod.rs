//! Presence module.
//!
//! Tracks which users are joined to the active workspace.

mod tracker;

pub use tracker::PresenceTracker;
