//! Push channel transport
//!
//! Owns at most one WebSocket connection at a time and reports what happens
//! on it as generation-tagged events.

mod channel;
mod connection;
mod event;

pub use channel::{ChannelTransport, SendOutcome, TransportConfig};
pub use event::{TransportEvent, TransportEventKind, TransportEvents};
