//! Test helpers for integration tests
//!
//! Provides an in-process push server that records what clients send and
//! pushes scripted frames, plus utilities for waiting on asynchronous state.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aimem_core::{Envelope, WorkspaceId};
use aimem_sync::{ClientFrame, ConnectionStatus, ServerFrame, SyncClient};
use anyhow::{bail, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

/// Default time to wait for asynchronous state
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One accepted WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// `workspaceId` query parameter of the upgrade request
    pub query_workspace: Option<String>,
    /// Workspaces announced with `join_workspace`
    pub joins: Vec<WorkspaceId>,
    /// Envelopes received as `message` frames
    pub messages: Vec<Envelope>,
    pub open: bool,
}

#[derive(Debug, Clone)]
enum PushCommand {
    Frame(String),
    Close,
}

struct PushInner {
    connections: Mutex<Vec<ConnectionRecord>>,
    changed: Notify,
    commands: broadcast::Sender<PushCommand>,
    reject: AtomicBool,
}

type PushState = Arc<PushInner>;

/// In-process push server instance that manages lifecycle
pub struct PushServer {
    pub addr: SocketAddr,
    state: PushState,
    _handle: JoinHandle<()>,
}

impl PushServer {
    /// Start a push server that accepts every connection
    pub async fn start() -> Result<Self> {
        Self::start_with(false).await
    }

    /// Start a push server that refuses every WebSocket upgrade
    pub async fn start_rejecting() -> Result<Self> {
        Self::start_with(true).await
    }

    async fn start_with(reject: bool) -> Result<Self> {
        let (commands, _) = broadcast::channel(64);
        let state = Arc::new(PushInner {
            connections: Mutex::new(Vec::new()),
            changed: Notify::new(),
            commands,
            reject: AtomicBool::new(reject),
        });

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        // Bind to an ephemeral port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        // Spawn server task
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// WebSocket endpoint for `SyncConfig::url`
    pub fn endpoint(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Push a frame to every open connection
    pub fn push(&self, frame: &ServerFrame) -> Result<()> {
        let json = frame.to_json()?;
        self.push_raw(json);
        Ok(())
    }

    /// Push raw text to every open connection
    pub fn push_raw(&self, text: impl Into<String>) {
        let _ = self.state.commands.send(PushCommand::Frame(text.into()));
    }

    /// Close every open connection from the server side
    pub fn close_all(&self) {
        let _ = self.state.commands.send(PushCommand::Close);
    }

    /// Snapshot of all connections accepted so far
    pub fn connections(&self) -> Vec<ConnectionRecord> {
        self.state.connections.lock().clone()
    }

    /// Number of connections accepted so far
    pub fn total_connections(&self) -> usize {
        self.state.connections.lock().len()
    }

    /// Number of connections still open
    pub fn open_connections(&self) -> usize {
        self.state.connections.lock().iter().filter(|c| c.open).count()
    }

    /// Every `join_workspace` received, in order
    pub fn joins(&self) -> Vec<WorkspaceId> {
        self.state
            .connections
            .lock()
            .iter()
            .flat_map(|c| c.joins.clone())
            .collect()
    }

    /// Every envelope received, in order
    pub fn messages(&self) -> Vec<Envelope> {
        self.state
            .connections
            .lock()
            .iter()
            .flat_map(|c| c.messages.clone())
            .collect()
    }

    /// Wait until the recorded connections satisfy a condition
    pub async fn wait_for<F>(&self, what: &str, condition: F) -> Result<()>
    where
        F: Fn(&[ConnectionRecord]) -> bool,
    {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            let notified = self.state.changed.notified();
            if condition(&self.state.connections.lock()) {
                return Ok(());
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                bail!("timed out waiting for {what}");
            }
        }
    }

    /// Wait until `count` joins were received
    pub async fn wait_for_joins(&self, count: usize) -> Result<()> {
        self.wait_for("joins", |conns| {
            conns.iter().map(|c| c.joins.len()).sum::<usize>() >= count
        })
        .await
    }

    /// Wait until exactly `count` connections are open
    pub async fn wait_for_open(&self, count: usize) -> Result<()> {
        self.wait_for("open connections", |conns| {
            conns.iter().filter(|c| c.open).count() == count
        })
        .await
    }

    /// Wait until `count` envelopes were received
    pub async fn wait_for_messages(&self, count: usize) -> Result<()> {
        self.wait_for("messages", |conns| {
            conns.iter().map(|c| c.messages.len()).sum::<usize>() >= count
        })
        .await
    }
}

async fn ws_handler(
    State(state): State<PushState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    if state.reject.load(Ordering::SeqCst) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let workspace = params.get("workspaceId").cloned();
    ws.on_upgrade(move |socket| handle_socket(state, socket, workspace))
}

async fn handle_socket(state: PushState, mut socket: WebSocket, query_workspace: Option<String>) {
    // Subscribe before registering so no push after a join is missed
    let mut commands = state.commands.subscribe();

    let index = {
        let mut conns = state.connections.lock();
        conns.push(ConnectionRecord {
            query_workspace,
            joins: Vec::new(),
            messages: Vec::new(),
            open: true,
        });
        conns.len() - 1
    };
    state.changed.notify_waiters();

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    record_frame(&state, index, &text);
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
            command = commands.recv() => match command {
                Ok(PushCommand::Frame(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(PushCommand::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    state.connections.lock()[index].open = false;
    state.changed.notify_waiters();
}

fn record_frame(state: &PushState, index: usize, text: &str) {
    match ClientFrame::from_json(text) {
        Ok(ClientFrame::JoinWorkspace(join)) => {
            state.connections.lock()[index].joins.push(join.workspace_id);
        }
        Ok(ClientFrame::Message(envelope)) => {
            state.connections.lock()[index].messages.push(envelope);
        }
        Err(e) => tracing::warn!(error = %e, "Push server got a malformed client frame"),
    }
    state.changed.notify_waiters();
}

/// Wait until a client reaches a status
pub async fn wait_for_status(client: &SyncClient, expected: ConnectionStatus) -> Result<()> {
    let mut rx = client.watch_status();
    // Release the watch guard before `rx` goes out of scope
    let outcome = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(|s| *s == expected))
        .await
        .map(|changed| changed.map(drop));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => bail!("status channel closed"),
        Err(_) => bail!("timed out waiting for status {expected}, last {}", client.status()),
    }
}

/// Poll a condition until it holds
pub async fn wait_until<F>(what: &str, condition: F) -> Result<()>
where
    F: Fn() -> bool,
{
    let result = tokio::time::timeout(WAIT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => bail!("timed out waiting for {what}"),
    }
}

/// Run an async block with the default timeout
pub async fn within<T>(future: impl Future<Output = T>) -> Result<T> {
    Ok(tokio::time::timeout(WAIT_TIMEOUT, future).await?)
}

/// Initialize tracing once for the test binary
pub fn init_test_tracing() {
    let _ = aimem_common::try_init_tracing();
}
