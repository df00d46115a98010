//! Push-channel events
//!
//! The envelope is the unit of change notification exchanged with the sync server.

mod envelope;
mod message_type;

pub use envelope::{Envelope, OutgoingEnvelope};
pub use message_type::MessageType;
