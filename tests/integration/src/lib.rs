//! Integration test utilities for the sync client
//!
//! This crate provides an in-process WebSocket push server and fixtures for
//! driving a real `SyncClient` end to end.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
