use std::sync::Arc;

use cohort_events::{ClassroomEvent, EventBus};
use cohort_storage::{ClassroomId, GroupSetId, Store};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<GroupSetId, Arc<Mutex<()>>>;

use crate::config::ServerConfig;

/// Shared state behind every request.
#[derive(Clone)]
pub struct CohortServer {
    pub store: Arc<dyn Store>,
    pub events: Arc<dyn EventBus>,
    pub config: ServerConfig,
    locks: Arc<LockMap>,
}

impl CohortServer {
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventBus>, config: ServerConfig) -> Self {
        Self {
            store,
            events,
            config,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Exclusive section for one group set's read-decide-write-publish sequence.
    ///
    /// Reads that don't take the lock still see whole commits only, since every
    /// store write is a single transaction.
    pub async fn lock_group_set(&self, group_set_id: &GroupSetId) -> GroupSetGuard {
        let mutex = self.locks.entry(*group_set_id).or_default().clone();
        GroupSetGuard {
            locks: self.locks.clone(),
            group_set_id: *group_set_id,
            guard: Some(mutex.lock_owned().await),
        }
    }

    /// Lock several group sets. Always acquired in id order to rule out deadlock.
    pub async fn lock_group_sets(&self, mut ids: Vec<GroupSetId>) -> Vec<GroupSetGuard> {
        ids.sort();
        ids.dedup();
        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.lock_group_set(id).await);
        }
        guards
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.len()
    }

    /// Best-effort broadcast. A relay failure never undoes or fails a committed change.
    pub async fn publish(&self, classroom_id: &ClassroomId, event: ClassroomEvent) {
        let kind = event.name();
        if let Err(e) = self.events.publish(classroom_id, event).await {
            tracing::warn!(classroom_id = %classroom_id, event = kind, error = %e, "failed to publish event");
        }
    }
}

/// Held for the duration of a group set mutation.
///
/// Dropping the last guard of a group set also drops its lock entry, so ids that
/// were never valid or have since been deleted don't accumulate.
pub struct GroupSetGuard {
    locks: Arc<LockMap>,
    group_set_id: GroupSetId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GroupSetGuard {
    fn drop(&mut self) {
        // Release first so our own clone of the mutex no longer counts.
        self.guard.take();
        // Anyone waiting on or holding the mutex keeps a clone alive.
        self.locks
            .remove_if(&self.group_set_id, |_, m| Arc::strong_count(m) == 1);
    }
}
