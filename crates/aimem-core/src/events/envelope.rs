//! Envelope - typed, timestamped change notification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MessageType;
use crate::value_objects::{UserId, WorkspaceId};

/// Change notification received over the push channel
///
/// `kind` keeps the raw wire string so that envelopes with types this client
/// does not know are still accepted; use [`Envelope::message_type`] to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub data: Value,

    #[serde(default, alias = "teamId", skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,

    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub origin_user_id: Option<UserId>,

    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Classify the envelope, `None` for types outside the known set
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.kind)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Envelope(type={}", self.kind)?;
        if let Some(ws) = &self.workspace_id {
            write!(f, ", workspace={ws}")?;
        }
        write!(f, ", at={})", self.timestamp.to_rfc3339())
    }
}

/// Client-originated envelope before the transport stamps it
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEnvelope {
    pub kind: String,
    pub data: Value,
    pub workspace_id: Option<WorkspaceId>,
    pub origin_user_id: Option<UserId>,
}

impl OutgoingEnvelope {
    /// Create an outgoing envelope of a known type
    pub fn new(kind: MessageType, data: Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            data,
            workspace_id: None,
            origin_user_id: None,
        }
    }

    /// Scope the envelope to a workspace
    #[must_use]
    pub fn in_workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    /// Attribute the envelope to a user
    #[must_use]
    pub fn from_user(mut self, user_id: UserId) -> Self {
        self.origin_user_id = Some(user_id);
        self
    }

    /// Attach a timestamp, producing a wire envelope
    pub fn stamp(self, timestamp: DateTime<Utc>) -> Envelope {
        Envelope {
            kind: self.kind,
            data: self.data,
            workspace_id: self.workspace_id,
            origin_user_id: self.origin_user_id,
            timestamp,
        }
    }
}
