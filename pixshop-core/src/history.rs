// Undo/redo history for a single image.

use tracing::{debug, trace};

use crate::Snapshot;

/// Cursor-addressed sequence of snapshots. Never empty; the cursor is always valid.
#[derive(Debug, Clone)]
pub struct History {
    states: Vec<Snapshot>,
    current_index: usize,
    original: Snapshot,
}

impl History {
    pub fn new(initial_state: Snapshot) -> Self {
        trace!(snapshot = %initial_state.id(), "history created");
        Self {
            states: vec![initial_state.clone()],
            current_index: 0,
            original: initial_state,
        }
    }

    /// Record a new edit. Anything after the cursor is discarded first.
    /// Returns the new cursor.
    pub fn append(&mut self, snapshot: Snapshot) -> usize {
        let dropped = self.states.len() - (self.current_index + 1);
        self.states.truncate(self.current_index + 1);
        self.states.push(snapshot);
        self.current_index = self.states.len() - 1;
        debug!(
            cursor = self.current_index,
            dropped_future = dropped,
            "history appended"
        );
        self.current_index
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            trace!("undo unavailable");
            return None;
        }
        self.current_index -= 1;
        debug!(cursor = self.current_index, "history undo");
        Some(&self.states[self.current_index])
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            trace!("redo unavailable");
            return None;
        }
        self.current_index += 1;
        debug!(cursor = self.current_index, "history redo");
        Some(&self.states[self.current_index])
    }

    /// Back to the single original snapshot.
    pub fn reset(&mut self) {
        self.states.clear();
        self.states.push(self.original.clone());
        self.current_index = 0;
        debug!("history reset to original");
    }

    pub fn current(&self) -> &Snapshot {
        &self.states[self.current_index]
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.states.len() - 1
    }

    pub fn cursor(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.states
    }

    pub fn original(&self) -> &Snapshot {
        &self.original
    }

    /// Entries up to and including the cursor.
    pub fn committed(&self) -> &[Snapshot] {
        &self.states[..=self.current_index]
    }

    pub fn ever_applied(&self, pred: impl Fn(&Snapshot) -> bool) -> bool {
        self.committed().iter().any(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str) -> Snapshot {
        Snapshot::upload(name, name.as_bytes().to_vec())
    }

    #[test]
    fn test_new_history() {
        let a = snap("a.png");
        let history = History::new(a.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current(), &a);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_append_after_undo_branches() {
        let (a, b, c, d) = (snap("a"), snap("b"), snap("c"), snap("d"));
        let mut history = History::new(a.clone());
        history.append(b.clone());
        history.append(c.clone());
        assert_eq!(history.cursor(), 2);

        assert_eq!(history.undo(), Some(&b));
        assert_eq!(history.cursor(), 1);

        assert_eq!(history.append(d.clone()), 2);
        assert_eq!(history.entries(), &[a, b, d]);
        assert!(!history.entries().contains(&c));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_at_bounds() {
        let mut history = History::new(snap("a"));
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        let b = snap("b");
        history.append(b.clone());
        assert!(history.redo().is_none());
        history.undo();
        assert_eq!(history.redo(), Some(&b));
    }

    #[test]
    fn test_reset_keeps_original_only() {
        let a = snap("a");
        let mut history = History::new(a.clone());
        for name in ["b", "c", "d", "e"] {
            history.append(snap(name));
        }
        history.undo();

        history.reset();
        assert_eq!(history.entries(), &[a.clone()]);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.original(), &a);
    }

    #[test]
    fn test_committed_excludes_redo_future() {
        let mut history = History::new(snap("a"));
        history.append(snap("b"));
        history.append(snap("c"));
        history.undo();
        assert_eq!(history.committed().len(), 2);
        assert!(!history.ever_applied(|s| s.name() == "c"));
        assert!(history.ever_applied(|s| s.name() == "b"));
    }
}
