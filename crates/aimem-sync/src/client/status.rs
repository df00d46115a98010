//! Connection status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a client's push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No connection attempted yet
    #[default]
    Idle,
    /// Handshake in progress
    Connecting,
    /// Open and joined to the workspace
    Connected,
    /// Closed by either side
    Disconnected,
    /// Handshake or connection failed
    Errored,
}

impl ConnectionStatus {
    /// Check if moving to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Disconnected | Self::Errored, Self::Connecting)
                | (Self::Connecting, Self::Connected | Self::Errored | Self::Disconnected)
                | (Self::Connected, Self::Disconnected | Self::Errored)
                | (Self::Errored, Self::Disconnected)
        )
    }

    /// Check if a connection exists or is being established
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
