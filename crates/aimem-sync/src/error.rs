//! Sync error types

use std::time::Duration;
use thiserror::Error;

/// Push channel failures
///
/// These never escape [`crate::SyncClient`]; they are reported as an
/// `Errored` status carrying the rendered message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint is not a usable WebSocket URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Server refused or broke the handshake
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Handshake did not finish in time
    #[error("Handshake timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Established connection failed
    #[error("Connection lost: {0}")]
    Io(String),
}

/// Inbound data that could not be interpreted
///
/// Logged and skipped; the connection stays up.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON or has an unknown event name
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Binary frames are not part of the protocol
    #[error("Unsupported binary frame ({0} bytes)")]
    BinaryFrame(usize),

    /// Known envelope type without a required field
    #[error("Missing `{field}` in {kind} payload")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

impl ProtocolError {
    pub(crate) fn missing(kind: &'static str, field: &'static str) -> Self {
        Self::MissingField { kind, field }
    }
}

/// Sync result type
pub type TransportResult<T> = Result<T, TransportError>;
