//! Test fixtures and data builders

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aimem_common::SyncConfig;
use aimem_core::traits::{DocumentStore, RepoResult};
use aimem_core::{
    DomainError, Envelope, MessageType, OutgoingEnvelope, Thought, ThoughtId, ThoughtPatch, UserId,
    WorkspaceId,
};
use aimem_sync::ServerFrame;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Workspace used across scenarios
pub const TEAM: &str = "team-design";

pub fn workspace(id: &str) -> WorkspaceId {
    WorkspaceId::parse(id).expect("valid workspace id")
}

pub fn user(id: &str) -> UserId {
    UserId::parse(id).expect("valid user id")
}

pub fn thought_id(id: &str) -> ThoughtId {
    ThoughtId::parse(id).expect("valid thought id")
}

/// Sync config pointing at a push server, no workspace yet
pub fn sync_config(endpoint: &str) -> SyncConfig {
    let mut config = SyncConfig::new(endpoint);
    config.connect_timeout_ms = 2_000;
    config
}

/// Full thought representation as the server pushes it
pub fn thought_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": format!("# {title}"),
        "team": TEAM,
        "tags": [],
    })
}

/// Server-side envelope
pub fn envelope(kind: MessageType, data: Value) -> Envelope {
    OutgoingEnvelope::new(kind, data)
        .in_workspace(workspace(TEAM))
        .stamp(Utc::now())
}

/// `message` frame carrying an envelope
pub fn message_frame(kind: MessageType, data: Value) -> ServerFrame {
    ServerFrame::Message(envelope(kind, data))
}

/// `message` frame with a type the client does not know
pub fn unknown_frame(kind: &str) -> ServerFrame {
    let mut env = envelope(MessageType::TeamSync, Value::Null);
    env.kind = kind.to_string();
    ServerFrame::Message(env)
}

/// In-memory document store counting fetches
#[derive(Default)]
pub struct MemoryStore {
    thoughts: Mutex<HashMap<ThoughtId, Thought>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn with(thoughts: impl IntoIterator<Item = Thought>) -> Arc<Self> {
        let store = Self::default();
        store
            .thoughts
            .lock()
            .extend(thoughts.into_iter().map(|t| (t.id.clone(), t)));
        Arc::new(store)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: &ThoughtId) -> RepoResult<Thought> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.thoughts
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::ThoughtNotFound(id.clone()))
    }

    async fn update(&self, id: &ThoughtId, patch: &ThoughtPatch) -> RepoResult<Thought> {
        let mut thoughts = self.thoughts.lock();
        let thought = thoughts
            .get_mut(id)
            .ok_or_else(|| DomainError::ThoughtNotFound(id.clone()))?;
        thought.apply(patch);
        Ok(thought.clone())
    }
}
