//! Viewable handles derived from snapshots.
//!
//! A handle (a data URL, a texture, an object URL) is recomputed from a
//! snapshot's payload and must be released once that snapshot is no longer
//! reachable from any history or the pending preview.

use std::collections::{HashMap, HashSet};

use crate::{Snapshot, SnapshotId};

#[derive(Debug)]
pub struct ViewCache<H> {
    handles: HashMap<SnapshotId, H>,
}

impl<H> Default for ViewCache<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<H> ViewCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with(&mut self, snapshot: &Snapshot, make: impl FnOnce(&Snapshot) -> H) -> &H {
        self.handles.entry(snapshot.id()).or_insert_with(|| {
            tracing::trace!(snapshot = %snapshot.id(), "view handle created");
            make(snapshot)
        })
    }

    pub fn get(&self, id: SnapshotId) -> Option<&H> {
        self.handles.get(&id)
    }

    /// Drop every handle whose snapshot is not in `reachable`. The released
    /// handles are returned so the caller can free any backing resource.
    pub fn release_unreachable(&mut self, reachable: &HashSet<SnapshotId>) -> Vec<H> {
        let stale: Vec<SnapshotId> = self
            .handles
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();

        let released: Vec<H> = stale
            .into_iter()
            .filter_map(|id| self.handles.remove(&id))
            .collect();

        if !released.is_empty() {
            tracing::debug!(released = released.len(), live = self.handles.len(), "view handles released");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_reused_then_released() {
        let a = Snapshot::upload("a.png", vec![1u8]);
        let b = Snapshot::upload("b.png", vec![2u8]);
        let mut cache = ViewCache::new();

        let mut made = 0;
        cache.get_or_insert_with(&a, |s| {
            made += 1;
            s.data_url()
        });
        cache.get_or_insert_with(&a, |s| {
            made += 1;
            s.data_url()
        });
        cache.get_or_insert_with(&b, Snapshot::data_url);
        assert_eq!(made, 1);
        assert_eq!(cache.len(), 2);

        let reachable: HashSet<_> = [b.id()].into_iter().collect();
        let released = cache.release_unreachable(&reachable);
        assert_eq!(released, vec![a.data_url()]);
        assert!(cache.get(a.id()).is_none());
        assert!(cache.get(b.id()).is_some());
    }
}
