//! Envelope message types
//!
//! The closed set of change notifications the sync server pushes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope message types
///
/// These are the names carried in the `type` field of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // Document events
    /// A thought's content or metadata changed
    ThoughtUpdated,
    /// A new thought was written
    ThoughtCreated,
    /// A thought was removed
    ThoughtDeleted,
    /// The team finished a bulk sync
    TeamSync,

    // Presence events
    /// A user joined the workspace channel
    UserJoined,
    /// A user left the workspace channel
    UserLeft,
}

impl MessageType {
    /// All message types, in wire order
    pub const ALL: [Self; 6] = [
        Self::ThoughtUpdated,
        Self::ThoughtCreated,
        Self::ThoughtDeleted,
        Self::TeamSync,
        Self::UserJoined,
        Self::UserLeft,
    ];

    /// Get the wire representation of the message type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThoughtUpdated => "thought_updated",
            Self::ThoughtCreated => "thought_created",
            Self::ThoughtDeleted => "thought_deleted",
            Self::TeamSync => "team_sync",
            Self::UserJoined => "user_joined",
            Self::UserLeft => "user_left",
        }
    }

    /// Parse a message type from its wire name
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "thought_updated" => Some(Self::ThoughtUpdated),
            "thought_created" => Some(Self::ThoughtCreated),
            "thought_deleted" => Some(Self::ThoughtDeleted),
            "team_sync" => Some(Self::TeamSync),
            "user_joined" => Some(Self::UserJoined),
            "user_left" => Some(Self::UserLeft),
            _ => None,
        }
    }

    /// Check if this type concerns presence rather than cached documents
    #[must_use]
    pub const fn is_presence(self) -> bool {
        matches!(self, Self::UserJoined | Self::UserLeft)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        kind.as_str().to_string()
    }
}
