//! Shared status store, the single source of truth for job outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{RenderState, RenderStatus};

/// Key-value map from record id to render status.
///
/// Writes replace the whole entry for an id, so a reader sees either the
/// previous status or the new one, never a mix. Last write wins; the store
/// does not serialize concurrent renders for the same id. The pipeline never
/// removes entries; [`StatusStore::purge_older_than`] exists for an external
/// retention policy.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<Uuid, RenderStatus>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status for `id`, `None` when the record was never submitted.
    pub async fn get(&self, id: Uuid) -> Option<RenderStatus> {
        let map = self.inner.read().await;
        map.get(&id).cloned()
    }

    /// Replace the status entry for the id carried by `status`.
    pub async fn set(&self, status: RenderStatus) {
        let mut map = self.inner.write().await;
        map.insert(status.id, status);
    }

    /// Lifecycle state for `id`; absence reads as `Pending`.
    pub async fn state_of(&self, id: Uuid) -> RenderState {
        let map = self.inner.read().await;
        map.get(&id).map(|s| s.state).unwrap_or(RenderState::Pending)
    }

    /// Number of tracked entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop terminal entries older than `cutoff`. In-flight entries are kept
    /// regardless of age so a late worker still has somewhere to write.
    /// Returns the number of purged entries.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, status| !status.is_terminal() || status.updated_at >= cutoff);
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn absent_entry_reads_as_pending() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        assert!(store.get(id).await.is_none());
        assert_eq!(store.state_of(id).await, RenderState::Pending);
    }

    #[tokio::test]
    async fn set_overwrites_discarding_prior_outcome() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();

        store
            .set(RenderStatus::done(id, Bytes::from_static(b"%PDF-1.7 old")))
            .await;
        store.set(RenderStatus::generating(id)).await;

        let status = store.get(id).await.expect("present");
        assert_eq!(status.state, RenderState::Generating);
        assert!(status.artifact.is_none(), "stale artifact must be discarded");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn purge_removes_only_old_terminal_entries() {
        let store = StatusStore::new();

        let done_id = Uuid::new_v4();
        let mut done = RenderStatus::done(done_id, Bytes::from_static(b"%PDF"));
        done.updated_at = Utc::now() - ChronoDuration::hours(2);
        store.set(done).await;

        let inflight_id = Uuid::new_v4();
        let mut inflight = RenderStatus::generating(inflight_id);
        inflight.updated_at = Utc::now() - ChronoDuration::hours(2);
        store.set(inflight).await;

        let fresh_id = Uuid::new_v4();
        store
            .set(RenderStatus::failed(fresh_id, "font missing"))
            .await;

        let purged = store
            .purge_older_than(Utc::now() - ChronoDuration::hours(1))
            .await;

        assert_eq!(purged, 1);
        assert!(store.get(done_id).await.is_none());
        assert!(store.get(inflight_id).await.is_some(), "in-flight entries survive");
        assert!(store.get(fresh_id).await.is_some(), "fresh terminal entries survive");
    }
}
