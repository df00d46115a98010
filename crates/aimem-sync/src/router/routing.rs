//! Message router

use super::{CacheAction, PresenceAction, Reconciliation};
use crate::error::ProtocolError;
use aimem_cache::{CacheKey, Collection, PresenceTracker, QueryCache};
use aimem_core::{Envelope, MessageType, ThoughtId, UserId};
use serde_json::Value;

/// Maps envelopes to reconciliations and applies them
pub struct MessageRouter;

impl MessageRouter {
    /// Classify an envelope
    ///
    /// Unknown types are ignored. A known type whose payload lacks what it
    /// needs is a [`ProtocolError`].
    pub fn route(envelope: &Envelope) -> Result<Reconciliation, ProtocolError> {
        let Some(kind) = envelope.message_type() else {
            tracing::debug!(event_type = %envelope.kind, "Ignoring unknown envelope type");
            return Ok(Reconciliation::Ignore);
        };

        let plan = match kind {
            MessageType::ThoughtUpdated => {
                let id = thought_id(kind, &envelope.data)?;
                Reconciliation::Cache(vec![
                    CacheAction::Replace {
                        key: CacheKey::thought(&id),
                        value: envelope.data.clone(),
                    },
                    CacheAction::Invalidate(Collection::Thoughts),
                ])
            }
            MessageType::ThoughtCreated => Reconciliation::Cache(vec![
                CacheAction::Invalidate(Collection::Thoughts),
                CacheAction::Invalidate(Collection::SystemStats),
            ]),
            MessageType::ThoughtDeleted => {
                let id = thought_id(kind, &envelope.data)?;
                Reconciliation::Cache(vec![
                    CacheAction::Remove(CacheKey::thought(&id)),
                    CacheAction::Invalidate(Collection::Thoughts),
                    CacheAction::Invalidate(Collection::SystemStats),
                ])
            }
            MessageType::TeamSync => Reconciliation::Cache(vec![
                CacheAction::Invalidate(Collection::Thoughts),
                CacheAction::Invalidate(Collection::Teams),
                CacheAction::Invalidate(Collection::SystemStats),
            ]),
            MessageType::UserJoined => {
                Reconciliation::Presence(PresenceAction::Join(user_id(kind, envelope)?))
            }
            MessageType::UserLeft => {
                Reconciliation::Presence(PresenceAction::Leave(user_id(kind, envelope)?))
            }
        };

        Ok(plan)
    }

    /// Apply a reconciliation
    ///
    /// Returns whether presence changed.
    pub fn apply(
        reconciliation: &Reconciliation,
        cache: &QueryCache,
        presence: &mut PresenceTracker,
    ) -> bool {
        match reconciliation {
            Reconciliation::Cache(actions) => {
                for action in actions {
                    match action {
                        CacheAction::Replace { key, value } => cache.replace(key.clone(), value.clone()),
                        CacheAction::Remove(key) => cache.remove(key),
                        CacheAction::Invalidate(collection) => cache.invalidate(collection.clone()),
                    }
                }
                false
            }
            Reconciliation::Presence(PresenceAction::Join(user)) => presence.join(user.clone()),
            Reconciliation::Presence(PresenceAction::Leave(user)) => presence.leave(user),
            Reconciliation::Ignore => false,
        }
    }

    /// Route and apply in one step, logging and skipping bad envelopes
    ///
    /// Returns whether presence changed.
    pub fn handle(envelope: &Envelope, cache: &QueryCache, presence: &mut PresenceTracker) -> bool {
        match Self::route(envelope) {
            Ok(reconciliation) => {
                tracing::debug!(event_type = %envelope.kind, "Applying envelope");
                Self::apply(&reconciliation, cache, presence)
            }
            Err(e) => {
                tracing::warn!(event_type = %envelope.kind, error = %e, "Skipping envelope");
                false
            }
        }
    }
}

/// Thought id from `data.id`, or `data` itself when it is a bare id
fn thought_id(kind: MessageType, data: &Value) -> Result<ThoughtId, ProtocolError> {
    data.get("id")
        .and_then(ThoughtId::from_json)
        .or_else(|| ThoughtId::from_json(data))
        .ok_or_else(|| ProtocolError::missing(kind.as_str(), "id"))
}

/// User id from `data` (string, or object with `userId`/`id`), falling back
/// to the envelope's originating user
fn user_id(kind: MessageType, envelope: &Envelope) -> Result<UserId, ProtocolError> {
    let data = &envelope.data;
    let raw = data
        .as_str()
        .or_else(|| data.get("userId").and_then(Value::as_str))
        .or_else(|| data.get("id").and_then(Value::as_str));

    match raw {
        Some(raw) => UserId::parse(raw).map_err(|_| ProtocolError::missing(kind.as_str(), "userId")),
        None => envelope
            .origin_user_id
            .clone()
            .ok_or_else(|| ProtocolError::missing(kind.as_str(), "userId")),
    }
}
