//! Transport events

use aimem_core::{Envelope, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What happened on a connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    /// Handshake finished and the workspace join was sent
    Opened,
    /// Connection ended
    Closed(String),
    /// Handshake or connection failure
    Errored(String),
    /// Change notification (presence frames are delivered as envelopes too)
    Envelope(Envelope),
    /// Full presence list
    PresenceSnapshot(Vec<UserId>),
}

/// Event tagged with the connection generation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    pub generation: u64,
    pub kind: TransportEventKind,
}

/// Receiving half of the transport event channel
///
/// Events from connections that were torn down or replaced are discarded.
#[derive(Debug)]
pub struct TransportEvents {
    rx: mpsc::Receiver<TransportEvent>,
    generation: Arc<AtomicU64>,
}

impl TransportEvents {
    pub(crate) fn new(rx: mpsc::Receiver<TransportEvent>, generation: Arc<AtomicU64>) -> Self {
        Self { rx, generation }
    }

    /// Receive the next event of the current connection
    ///
    /// Returns `None` once the transport is dropped.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        loop {
            let event = self.rx.recv().await?;
            let current = self.generation.load(Ordering::SeqCst);
            if event.generation == current {
                return Some(event);
            }
            tracing::trace!(
                generation = event.generation,
                current,
                "Discarding event from superseded connection"
            );
        }
    }
}

/// Sending side used by a connection task
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    tx: mpsc::Sender<TransportEvent>,
    generation: u64,
}

impl Emitter {
    pub(crate) fn new(tx: mpsc::Sender<TransportEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event; returns false if nobody listens anymore
    pub(crate) async fn emit(&self, kind: TransportEventKind) -> bool {
        self.tx
            .send(TransportEvent {
                generation: self.generation,
                kind,
            })
            .await
            .is_ok()
    }
}
