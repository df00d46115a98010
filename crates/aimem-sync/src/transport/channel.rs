//! Channel transport
//!
//! Single-connection WebSocket transport with generation tracking.

use super::connection::ConnectionTask;
use super::event::{Emitter, TransportEvent, TransportEvents};
use crate::protocol::ClientFrame;
use aimem_common::{AppError, AppResult, SyncConfig};
use aimem_core::{OutgoingEnvelope, WorkspaceId};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Transport tuning
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket endpoint without the workspace query
    pub endpoint: String,
    /// Handshake timeout
    pub connect_timeout: Duration,
    /// Capacity of the event channel
    pub event_buffer: usize,
    /// Capacity of the outgoing frame channel
    pub outgoing_buffer: usize,
}

impl TransportConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from(&SyncConfig::new(endpoint))
    }
}

impl From<&SyncConfig> for TransportConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            endpoint: config.url.clone(),
            connect_timeout: config.connect_timeout(),
            event_buffer: config.event_buffer.max(1),
            outgoing_buffer: config.outgoing_buffer.max(1),
        }
    }
}

/// Result of [`ChannelTransport::send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the open connection
    Sent,
    /// No open connection (or its buffer is full); nothing is queued
    Dropped,
}

impl SendOutcome {
    /// Treat a dropped send as an error
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Sent => Ok(()),
            Self::Dropped => Err(AppError::NotConnected),
        }
    }
}

/// The live connection, if any
struct ActiveConnection {
    workspace: WorkspaceId,
    generation: u64,
    outgoing: mpsc::Sender<ClientFrame>,
    open: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ActiveConnection {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// WebSocket transport owning at most one connection
///
/// Handshake and connection failures are never returned from calls; they
/// arrive as [`TransportEvent`]s on the paired [`TransportEvents`].
pub struct ChannelTransport {
    config: TransportConfig,
    generation: Arc<AtomicU64>,
    events: mpsc::Sender<TransportEvent>,
    active: Mutex<Option<ActiveConnection>>,
}

impl ChannelTransport {
    /// Create a transport and the receiver for its events
    #[must_use]
    pub fn new(config: TransportConfig) -> (Self, TransportEvents) {
        let (tx, rx) = mpsc::channel(config.event_buffer);
        let generation = Arc::new(AtomicU64::new(0));
        let events = TransportEvents::new(rx, generation.clone());

        (
            Self {
                config,
                generation,
                events: tx,
                active: Mutex::new(None),
            },
            events,
        )
    }

    /// Open a connection to a workspace
    ///
    /// No-op while a connection (or attempt) to the same workspace is
    /// running. A connection to another workspace is torn down first.
    /// Must be called from within a Tokio runtime.
    ///
    /// Returns the generation of the connection now in charge.
    pub fn connect(&self, workspace: &WorkspaceId) -> u64 {
        let mut active = self.active.lock();

        if let Some(conn) = active.as_ref() {
            if conn.workspace == *workspace && conn.is_running() {
                tracing::debug!(
                    workspace_id = %workspace,
                    generation = conn.generation,
                    "Connection already active"
                );
                return conn.generation;
            }
        }

        if active.take().is_some() {
            tracing::debug!(workspace_id = %workspace, "Replacing previous connection");
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (outgoing_tx, outgoing_rx) = mpsc::channel(self.config.outgoing_buffer);
        let open = Arc::new(AtomicBool::new(false));

        let task = ConnectionTask {
            endpoint: self.config.endpoint.clone(),
            workspace: workspace.clone(),
            connect_timeout: self.config.connect_timeout,
            outgoing: outgoing_rx,
            open: open.clone(),
            emitter: Emitter::new(self.events.clone(), generation),
        };

        tracing::info!(workspace_id = %workspace, generation, "Connecting");

        *active = Some(ActiveConnection {
            workspace: workspace.clone(),
            generation,
            outgoing: outgoing_tx,
            open,
            task: tokio::spawn(task.run()),
        });

        generation
    }

    /// Tear down the current connection
    ///
    /// Events the old connection already produced are discarded. Returns
    /// false if there was nothing to tear down.
    pub fn disconnect(&self) -> bool {
        let Some(conn) = self.active.lock().take() else {
            return false;
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        conn.open.store(false, Ordering::SeqCst);

        tracing::info!(
            workspace_id = %conn.workspace,
            generation = conn.generation,
            "Disconnecting"
        );

        // Dropping the sender makes the task close the socket; a task still
        // in its handshake stops at the next poll.
        drop(conn.outgoing);
        true
    }

    /// Send a client-originated envelope
    ///
    /// The envelope is stamped with the current time and scoped to the
    /// connected workspace unless it names one. Without an open connection
    /// the envelope is dropped.
    pub fn send(&self, envelope: OutgoingEnvelope) -> SendOutcome {
        let active = self.active.lock();
        let Some(conn) = active.as_ref().filter(|c| c.open.load(Ordering::SeqCst)) else {
            tracing::warn!(event_type = %envelope.kind, "Not connected, dropping outgoing envelope");
            return SendOutcome::Dropped;
        };

        let mut envelope = envelope;
        if envelope.workspace_id.is_none() {
            envelope.workspace_id = Some(conn.workspace.clone());
        }
        let kind = envelope.kind.clone();

        match conn
            .outgoing
            .try_send(ClientFrame::Message(envelope.stamp(Utc::now())))
        {
            Ok(()) => {
                tracing::debug!(event_type = %kind, generation = conn.generation, "Envelope sent");
                SendOutcome::Sent
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(event_type = %kind, "Outgoing buffer full, dropping envelope");
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(event_type = %kind, "Connection closing, dropping envelope");
                SendOutcome::Dropped
            }
        }
    }

    /// Generation of the connection currently in charge
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Check if a connection is open and joined
    pub fn is_open(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|c| c.open.load(Ordering::SeqCst))
    }

    /// Check if a connection (or attempt) to this workspace is running
    pub fn is_active_for(&self, workspace: &WorkspaceId) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|c| c.workspace == *workspace && c.is_running())
    }

    /// Workspace of the current connection
    pub fn workspace(&self) -> Option<WorkspaceId> {
        self.active.lock().as_ref().map(|c| c.workspace.clone())
    }
}

impl std::fmt::Debug for ChannelTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("endpoint", &self.config.endpoint)
            .field("generation", &self.generation())
            .field("workspace", &self.workspace())
            .finish()
    }
}
