//! Connection task
//!
//! Drives one WebSocket connection from handshake to close.

use super::event::{Emitter, TransportEventKind};
use crate::error::{ProtocolError, TransportError, TransportResult};
use crate::protocol::{ClientFrame, ServerFrame};
use aimem_core::{MessageType, OutgoingEnvelope, UserId, WorkspaceId};
use chrono::Utc;
use futures_util::{Sink, SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Everything a connection task needs
pub(crate) struct ConnectionTask {
    pub endpoint: String,
    pub workspace: WorkspaceId,
    pub connect_timeout: Duration,
    pub outgoing: mpsc::Receiver<ClientFrame>,
    pub open: Arc<AtomicBool>,
    pub emitter: Emitter,
}

/// Build the connect URL: `<endpoint>?workspaceId=<id>`
pub(crate) fn endpoint_url(endpoint: &str, workspace: &WorkspaceId) -> TransportResult<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(TransportError::InvalidUrl(format!(
            "unsupported scheme `{}`",
            url.scheme()
        )));
    }
    url.query_pairs_mut()
        .append_pair("workspaceId", workspace.as_str());
    Ok(url)
}

impl ConnectionTask {
    /// Run until the server closes, the connection fails, or the transport
    /// drops the outgoing channel
    pub(crate) async fn run(self) {
        let Self {
            endpoint,
            workspace,
            connect_timeout,
            mut outgoing,
            open,
            emitter,
        } = self;
        let generation = emitter.generation();

        let url = match endpoint_url(&endpoint, &workspace) {
            Ok(url) => url,
            Err(e) => {
                fail(&emitter, &e).await;
                return;
            }
        };

        tracing::debug!(workspace_id = %workspace, generation, url = %url, "Opening push channel");

        let handshake = tokio::time::timeout(
            connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        );

        // Nothing is queued before open, so a closed outgoing channel here
        // means the transport gave up on this connection.
        let ws = tokio::select! {
            result = handshake => match result {
                Ok(Ok((ws, _response))) => ws,
                Ok(Err(e)) => {
                    fail(&emitter, &TransportError::Handshake(e.to_string())).await;
                    return;
                }
                Err(_) => {
                    fail(&emitter, &TransportError::Timeout(connect_timeout)).await;
                    return;
                }
            },
            None = outgoing.recv() => {
                tracing::debug!(workspace_id = %workspace, generation, "Connect cancelled");
                return;
            }
        };

        let (mut sink, mut stream) = ws.split();

        if let Err(e) = send_frame(&mut sink, &ClientFrame::join(workspace.clone())).await {
            fail(&emitter, &e).await;
            return;
        }

        open.store(true, Ordering::SeqCst);
        tracing::info!(workspace_id = %workspace, generation, "Push channel open");
        emitter.emit(TransportEventKind::Opened).await;

        let reason = loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(kind) = decode(&workspace, generation, &text) {
                            if !emitter.emit(kind).await {
                                break "event receiver dropped".to_string();
                            }
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let err = ProtocolError::BinaryFrame(bytes.len());
                        tracing::debug!(generation, error = %err, "Ignoring frame");
                    }
                    Some(Ok(Message::Close(frame))) => break close_reason(frame),
                    Some(Ok(_)) => {
                        // Ping/pong is answered by tungstenite
                    }
                    Some(Err(e)) => {
                        open.store(false, Ordering::SeqCst);
                        fail(&emitter, &TransportError::Io(e.to_string())).await;
                        return;
                    }
                    None => break "connection ended".to_string(),
                },
                frame = outgoing.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = send_frame(&mut sink, &frame).await {
                            open.store(false, Ordering::SeqCst);
                            fail(&emitter, &e).await;
                            return;
                        }
                    }
                    None => {
                        open.store(false, Ordering::SeqCst);
                        let _ = sink.close().await;
                        tracing::debug!(workspace_id = %workspace, generation, "Push channel closed locally");
                        return;
                    }
                },
            }
        };

        open.store(false, Ordering::SeqCst);
        tracing::info!(workspace_id = %workspace, generation, reason = %reason, "Push channel closed");
        emitter.emit(TransportEventKind::Closed(reason)).await;
    }
}

async fn fail(emitter: &Emitter, err: &TransportError) {
    tracing::warn!(generation = emitter.generation(), error = %err, "Push channel failed");
    emitter
        .emit(TransportEventKind::Errored(err.to_string()))
        .await;
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame) -> TransportResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = frame
        .to_json()
        .map_err(|e| TransportError::Io(format!("encode {}: {e}", frame.event_name())))?;
    tracing::trace!(frame = %frame, "Sending frame");
    sink.send(Message::text(json))
        .await
        .map_err(|e| TransportError::Io(e.to_string()))
}

/// Turn a text frame into an event, logging and skipping bad frames
fn decode(workspace: &WorkspaceId, generation: u64, text: &str) -> Option<TransportEventKind> {
    let frame = match ServerFrame::from_json(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(generation, error = %e, "Skipping malformed frame");
            return None;
        }
    };

    tracing::trace!(generation, event = frame.event_name(), "Frame received");

    Some(match frame {
        ServerFrame::Message(envelope) => TransportEventKind::Envelope(envelope),
        ServerFrame::UsersUpdated(users) => TransportEventKind::PresenceSnapshot(users),
        ServerFrame::UserJoined(user) => {
            presence_envelope(MessageType::UserJoined, user, workspace)
        }
        ServerFrame::UserLeft(user) => presence_envelope(MessageType::UserLeft, user, workspace),
    })
}

fn presence_envelope(kind: MessageType, user: UserId, workspace: &WorkspaceId) -> TransportEventKind {
    let envelope = OutgoingEnvelope::new(kind, serde_json::Value::String(user.to_string()))
        .in_workspace(workspace.clone())
        .from_user(user)
        .stamp(Utc::now());
    TransportEventKind::Envelope(envelope)
}

fn close_reason(frame: Option<CloseFrame<'_>>) -> String {
    match frame {
        Some(frame) if frame.reason.is_empty() => format!("closed by server ({})", u16::from(frame.code)),
        Some(frame) => format!("closed by server ({}): {}", u16::from(frame.code), frame.reason),
        None => "closed by server".to_string(),
    }
}
