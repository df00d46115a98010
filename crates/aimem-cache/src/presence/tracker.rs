//! Workspace presence tracking.
//!
//! Holds the users currently joined to one workspace's push channel. The set
//! keeps join order so views can render a stable list.

use aimem_core::UserId;

/// Users currently joined to the active workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceTracker {
    members: Vec<UserId>,
}

impl PresenceTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole membership with a server snapshot
    ///
    /// Duplicates in the snapshot are dropped, first occurrence wins.
    /// Returns whether the membership changed.
    pub fn snapshot(&mut self, users: impl IntoIterator<Item = UserId>) -> bool {
        let mut next: Vec<UserId> = Vec::new();
        for user in users {
            if !next.contains(&user) {
                next.push(user);
            }
        }
        let changed = next != self.members;
        self.members = next;

        tracing::debug!(count = self.members.len(), "Presence snapshot applied");
        changed
    }

    /// Add a user; no-op if already present
    pub fn join(&mut self, user: UserId) -> bool {
        if self.members.contains(&user) {
            tracing::trace!(user_id = %user, "Duplicate join ignored");
            return false;
        }
        tracing::debug!(user_id = %user, "User joined workspace");
        self.members.push(user);
        true
    }

    /// Remove a user; no-op if absent
    pub fn leave(&mut self, user: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|u| u != user);
        let changed = self.members.len() != before;
        if changed {
            tracing::debug!(user_id = %user, "User left workspace");
        }
        changed
    }

    /// Forget everyone (connection closed or failed)
    pub fn clear(&mut self) -> bool {
        let changed = !self.members.is_empty();
        self.members.clear();
        changed
    }

    /// Current members in join order
    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    /// Check if a user is present
    pub fn contains(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    /// Number of present users
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if nobody is present
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
