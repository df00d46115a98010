//! Sync client

use super::{ConnectionStatus, ReconnectPolicy};
use crate::router::MessageRouter;
use crate::transport::{
    ChannelTransport, SendOutcome, TransportConfig, TransportEvent, TransportEventKind,
    TransportEvents,
};
use aimem_cache::{PresenceTracker, SharedQueryCache};
use aimem_common::{AppError, SyncConfig};
use aimem_core::{OutgoingEnvelope, UserId, WorkspaceId};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Mutable client state, guarded by one lock
struct ClientState {
    status: ConnectionStatus,
    workspace: Option<WorkspaceId>,
    enabled: bool,
    last_error: Option<String>,
    presence: PresenceTracker,
    attempts: u32,
}

struct ClientInner {
    transport: ChannelTransport,
    cache: SharedQueryCache,
    policy: ReconnectPolicy,
    state: Mutex<ClientState>,
    status_tx: watch::Sender<ConnectionStatus>,
    presence_tx: watch::Sender<Vec<UserId>>,
}

/// Realtime sync client for one workspace at a time
///
/// Owns its transport and presence set; the cache is shared. Inbound
/// envelopes are applied in delivery order by a background driver task.
/// Dropping the client disconnects it.
pub struct SyncClient {
    inner: Arc<ClientInner>,
    driver: JoinHandle<()>,
}

impl SyncClient {
    /// Create a client and connect if the config names a workspace
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &SyncConfig, cache: SharedQueryCache) -> Self {
        let (transport, events) = ChannelTransport::new(TransportConfig::from(config));

        let workspace = config
            .workspace
            .as_deref()
            .and_then(|raw| match WorkspaceId::parse(raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(workspace = raw, error = %e, "Ignoring invalid workspace id");
                    None
                }
            });

        let (status_tx, _) = watch::channel(ConnectionStatus::Idle);
        let (presence_tx, _) = watch::channel(Vec::new());

        let inner = Arc::new(ClientInner {
            transport,
            cache,
            policy: ReconnectPolicy::from(&config.reconnect),
            state: Mutex::new(ClientState {
                status: ConnectionStatus::Idle,
                workspace,
                enabled: config.enabled,
                last_error: None,
                presence: PresenceTracker::new(),
                attempts: 0,
            }),
            status_tx,
            presence_tx,
        });

        let driver = tokio::spawn(drive(Arc::downgrade(&inner), events));

        {
            let mut state = inner.state.lock();
            inner.ensure_connection(&mut state);
        }

        Self { inner, driver }
    }

    /// Switch workspace; `None` leaves the current one
    ///
    /// Supplying the current workspace again is a no-op.
    pub fn set_workspace(&self, workspace: Option<WorkspaceId>) {
        let mut state = self.inner.state.lock();
        if state.workspace == workspace {
            return;
        }

        tracing::info!(
            from = ?state.workspace.as_ref().map(WorkspaceId::as_str),
            to = ?workspace.as_ref().map(WorkspaceId::as_str),
            "Workspace changed"
        );

        self.inner.teardown(&mut state);
        state.workspace = workspace;
        state.attempts = 0;
        self.inner.ensure_connection(&mut state);
    }

    /// Enable or disable syncing
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.inner.state.lock();
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;

        if enabled {
            state.attempts = 0;
            self.inner.ensure_connection(&mut state);
        } else {
            self.inner.teardown(&mut state);
        }
    }

    /// Tear down any connection and connect again
    ///
    /// Returns false if there is no workspace or syncing is disabled.
    pub fn reconnect(&self) -> bool {
        let mut state = self.inner.state.lock();
        self.inner.teardown(&mut state);
        state.attempts = 0;

        let started = self.inner.ensure_connection(&mut state);
        if !started {
            tracing::warn!(
                has_workspace = state.workspace.is_some(),
                enabled = state.enabled,
                "Reconnect requested but nothing to connect to"
            );
        }
        started
    }

    /// Close the connection and clear presence; idempotent
    pub fn disconnect(&self) {
        self.inner.shutdown();
    }

    /// Send a client-originated envelope
    pub fn send(&self, envelope: OutgoingEnvelope) -> SendOutcome {
        self.inner.transport.send(envelope)
    }

    /// Current status
    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().status
    }

    /// Subscribe to status changes
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Subscribe to presence changes
    pub fn watch_presence(&self) -> watch::Receiver<Vec<UserId>> {
        self.inner.presence_tx.subscribe()
    }

    /// Message of the last connection failure, cleared once connected
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// The last connection failure as an application error
    pub fn error(&self) -> Option<AppError> {
        self.last_error().map(AppError::Connection)
    }

    /// Users currently joined to the workspace
    pub fn active_users(&self) -> Vec<UserId> {
        self.inner.state.lock().presence.members().to_vec()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn workspace(&self) -> Option<WorkspaceId> {
        self.inner.state.lock().workspace.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Shared cache this client reconciles into
    pub fn cache(&self) -> &SharedQueryCache {
        &self.inner.cache
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.inner.shutdown();
        self.driver.abort();
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SyncClient")
            .field("status", &state.status)
            .field("workspace", &state.workspace)
            .field("enabled", &state.enabled)
            .finish()
    }
}

/// Apply transport events in order until the client goes away
async fn drive(inner: Weak<ClientInner>, mut events: TransportEvents) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle_event(event);
    }
    tracing::trace!("Sync driver stopped");
}

impl ClientInner {
    fn handle_event(self: &Arc<Self>, event: TransportEvent) {
        let mut state = self.state.lock();

        // Checked under the lock so nothing lands after a disconnect returns.
        if event.generation != self.transport.generation() {
            tracing::trace!(generation = event.generation, "Dropping superseded event");
            return;
        }

        match event.kind {
            TransportEventKind::Opened => {
                state.last_error = None;
                state.attempts = 0;
                self.transition(&mut state, ConnectionStatus::Connected);
            }
            TransportEventKind::Closed(reason) => {
                tracing::info!(reason = %reason, "Sync connection closed");
                self.transition(&mut state, ConnectionStatus::Disconnected);
                self.clear_presence(&mut state);
            }
            TransportEventKind::Errored(message) => {
                tracing::warn!(error = %message, "Sync connection failed");
                state.last_error = Some(message);
                self.transition(&mut state, ConnectionStatus::Errored);
                self.clear_presence(&mut state);
                self.schedule_retry(&mut state, event.generation);
            }
            TransportEventKind::Envelope(envelope) => {
                if MessageRouter::handle(&envelope, &self.cache, &mut state.presence) {
                    self.publish_presence(&state);
                }
            }
            TransportEventKind::PresenceSnapshot(users) => {
                if state.presence.snapshot(users) {
                    self.publish_presence(&state);
                }
            }
        }
    }

    /// Start a connection if a workspace is set, syncing is enabled, and no
    /// connection to it is already running
    fn ensure_connection(&self, state: &mut ClientState) -> bool {
        let Some(workspace) = state.workspace.clone() else {
            return false;
        };
        if !state.enabled {
            return false;
        }
        if state.status.is_active() && self.transport.is_active_for(&workspace) {
            tracing::debug!(workspace_id = %workspace, "Already connected");
            return false;
        }

        self.teardown(state);
        self.transition(state, ConnectionStatus::Connecting);
        self.transport.connect(&workspace);
        true
    }

    fn teardown(&self, state: &mut ClientState) {
        self.transport.disconnect();
        if state.status.is_active() || state.status == ConnectionStatus::Errored {
            self.transition(state, ConnectionStatus::Disconnected);
        }
        state.last_error = None;
        self.clear_presence(state);
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();
        self.teardown(&mut state);
    }

    fn schedule_retry(self: &Arc<Self>, state: &mut ClientState, generation: u64) {
        let attempt = state.attempts + 1;
        let Some(delay) = self.policy.delay(attempt) else {
            if self.policy.enabled {
                tracing::warn!(attempts = state.attempts, "Reconnect attempts exhausted");
            }
            return;
        };
        state.attempts = attempt;

        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");

        let inner = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.retry(generation);
            }
        });
    }

    fn retry(&self, generation: u64) {
        let mut state = self.state.lock();
        // Anything the caller did in the meantime wins.
        if state.status != ConnectionStatus::Errored || self.transport.generation() != generation {
            return;
        }
        self.ensure_connection(&mut state);
    }

    fn transition(&self, state: &mut ClientState, next: ConnectionStatus) -> bool {
        if state.status == next {
            return false;
        }
        if !state.status.can_transition_to(next) {
            tracing::debug!(from = %state.status, to = %next, "Ignoring illegal status transition");
            return false;
        }

        tracing::debug!(from = %state.status, to = %next, "Status changed");
        state.status = next;
        self.status_tx.send_replace(next);
        true
    }

    fn clear_presence(&self, state: &mut ClientState) {
        if state.presence.clear() {
            self.publish_presence(state);
        }
    }

    fn publish_presence(&self, state: &ClientState) {
        self.presence_tx.send_replace(state.presence.members().to_vec());
    }
}
