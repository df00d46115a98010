//! # aimem-sync
//!
//! Realtime push channel client for shared thought workspaces.
//!
//! The client keeps one WebSocket connection per workspace, classifies the
//! change notifications the server pushes, and reconciles them into the
//! shared [`aimem_cache::QueryCache`] and the workspace presence set.
//!
//! ## Example
//!
//! ```ignore
//! use aimem_cache::create_shared_cache;
//! use aimem_common::SyncConfig;
//! use aimem_sync::SyncClient;
//!
//! let cache = create_shared_cache();
//! let client = SyncClient::new(&SyncConfig::new("ws://localhost:8000/ws"), cache.clone());
//! client.set_workspace(Some("team-design".parse()?));
//!
//! let mut status = client.watch_status();
//! status.changed().await?;
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod router;
pub mod transport;

pub use client::{ConnectionStatus, ReconnectPolicy, SyncClient};
pub use error::{ProtocolError, TransportError};
pub use protocol::{ClientFrame, JoinWorkspace, ServerFrame};
pub use router::{CacheAction, MessageRouter, PresenceAction, Reconciliation};
pub use transport::{
    ChannelTransport, SendOutcome, TransportConfig, TransportEvent, TransportEventKind,
    TransportEvents,
};
