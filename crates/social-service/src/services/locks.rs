//! Per-actor serialization of follow toggles
//!
//! Two toggles by the same actor must not interleave their read-decide-write
//! sequences, otherwise both observe "not following" and both try to insert
//! the edge. Toggles by different actors never contend.

use std::sync::Arc;

use dashmap::DashMap;
use social_core::Snowflake;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<Snowflake, Arc<Mutex<()>>>;

/// Keyed async mutex, one slot per actor
#[derive(Clone, Default)]
pub struct FollowLocks {
    slots: Arc<LockMap>,
}

impl FollowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `actor`'s follow edges
    pub async fn acquire(&self, actor: Snowflake) -> FollowLockGuard {
        // Clone the slot out so the shard lock is released before awaiting.
        let slot = self.slots.entry(actor).or_default().clone();
        let guard = slot.lock_owned().await;

        FollowLockGuard {
            slots: Arc::clone(&self.slots),
            actor,
            guard: Some(guard),
        }
    }

    /// Number of actors that currently hold or wait on a slot
    pub fn active(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for FollowLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowLocks")
            .field("active", &self.slots.len())
            .finish()
    }
}

/// Held for the duration of one toggle; frees the slot when the last user
/// of it lets go.
pub struct FollowLockGuard {
    slots: Arc<LockMap>,
    actor: Snowflake,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FollowLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone of the Arc, so a count of one means
        // nobody else is queued on this actor.
        self.slots
            .remove_if(&self.actor, |_, slot| Arc::strong_count(slot) == 1);
    }
}
