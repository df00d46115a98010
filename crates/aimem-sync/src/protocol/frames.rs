//! Frame formats
//!
//! Defines the structure of every frame exchanged over the push channel.

use crate::error::ProtocolError;
use aimem_core::{Envelope, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A change notification
    Message(Envelope),
    /// Full presence list for the workspace
    UsersUpdated(Vec<UserId>),
    /// One user joined the workspace
    UserJoined(UserId),
    /// One user left the workspace
    UserLeft(UserId),
}

impl ServerFrame {
    /// Wire name of the frame's event
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::UsersUpdated(_) => "users_updated",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft(_) => "user_left",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a text frame received from the server
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }
}

/// Payload of the `join_workspace` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWorkspace {
    #[serde(alias = "teamId")]
    pub workspace_id: WorkspaceId,
}

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribe this connection to a workspace, sent once per connection
    JoinWorkspace(JoinWorkspace),
    /// A client-originated change notification
    Message(Envelope),
}

impl ClientFrame {
    /// Create a join frame for a workspace
    #[must_use]
    pub fn join(workspace_id: WorkspaceId) -> Self {
        Self::JoinWorkspace(JoinWorkspace { workspace_id })
    }

    /// Wire name of the frame's event
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::JoinWorkspace(_) => "join_workspace",
            Self::Message(_) => "message",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a text frame received from a client
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }
}

impl std::fmt::Display for ClientFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JoinWorkspace(join) => write!(f, "ClientFrame(join_workspace, {})", join.workspace_id),
            Self::Message(env) => write!(f, "ClientFrame(message, type={})", env.kind),
        }
    }
}
