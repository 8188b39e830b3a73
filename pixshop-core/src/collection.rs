//! The set of uploaded images and their histories.
//!
//! The collection is the single source of truth for image state. Every history
//! mutation goes through it, and it keeps the active id and the selection
//! consistent with the entries that actually exist.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{History, Snapshot};

/// Stable identity of an uploaded image for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub id: ImageId,
    pub name: String,
    pub history: History,
}

impl ImageEntry {
    pub fn original(&self) -> &Snapshot {
        self.history.original()
    }

    pub fn current(&self) -> &Snapshot {
        self.history.current()
    }
}

/// Result of `set_active`. Dependent transient state (focus point, crop
/// selection, pending preview) must be cleared on `Switched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSwitch {
    Unchanged,
    Switched { from: Option<ImageId>, to: ImageId },
}

#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    entries: Vec<ImageEntry>,
    selected: HashSet<ImageId>,
    active: Option<ImageId>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uploaded image. The first image added to an empty collection
    /// becomes active; every new image starts selected.
    pub fn add(&mut self, snapshot: Snapshot, name: impl Into<String>) -> ImageId {
        let id = ImageId::new();
        let name = name.into();

        tracing::info!(image_id = %id, name = %name, "image added");

        self.entries.push(ImageEntry {
            id,
            name,
            history: History::new(snapshot),
        });
        self.selected.insert(id);
        if self.active.is_none() {
            self.active = Some(id);
            tracing::debug!(image_id = %id, "image became active");
        }
        id
    }

    pub fn remove(&mut self, id: ImageId) -> Result<ImageEntry, CollectionError> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        self.selected.remove(&id);

        if self.active == Some(id) {
            self.active = self.entries.first().map(|e| e.id);
            tracing::debug!(
                removed = %id,
                new_active = ?self.active,
                "active image removed, reassigned"
            );
        }

        tracing::info!(image_id = %id, remaining = self.entries.len(), "image removed");
        Ok(entry)
    }

    pub fn set_active(&mut self, id: ImageId) -> Result<ActiveSwitch, CollectionError> {
        self.index_of(id)?;
        if self.active == Some(id) {
            return Ok(ActiveSwitch::Unchanged);
        }
        let from = self.active.replace(id);
        tracing::debug!(from = ?from, to = %id, "active image switched");
        Ok(ActiveSwitch::Switched { from, to: id })
    }

    /// Flip selection for `id`. Returns whether it is now selected.
    pub fn toggle_select(&mut self, id: ImageId) -> Result<bool, CollectionError> {
        self.index_of(id)?;
        let now_selected = if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        };
        tracing::trace!(image_id = %id, selected = now_selected, "selection toggled");
        Ok(now_selected)
    }

    pub fn select_all(&mut self) {
        self.selected = self.entries.iter().map(|e| e.id).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn snapshot_for(&self, id: ImageId) -> Result<&Snapshot, CollectionError> {
        Ok(self.entry(id)?.current())
    }

    pub fn append(&mut self, id: ImageId, snapshot: Snapshot) -> Result<usize, CollectionError> {
        let entry = self.entry_mut(id)?;
        let cursor = entry.history.append(snapshot);
        tracing::debug!(image_id = %id, cursor, "snapshot committed");
        Ok(cursor)
    }

    pub fn undo(&mut self, id: ImageId) -> Result<Option<&Snapshot>, CollectionError> {
        Ok(self.entry_mut(id)?.history.undo())
    }

    pub fn redo(&mut self, id: ImageId) -> Result<Option<&Snapshot>, CollectionError> {
        Ok(self.entry_mut(id)?.history.redo())
    }

    pub fn reset(&mut self, id: ImageId) -> Result<(), CollectionError> {
        self.entry_mut(id)?.history.reset();
        tracing::info!(image_id = %id, "image reset to original");
        Ok(())
    }

    pub fn history(&self, id: ImageId) -> Result<&History, CollectionError> {
        Ok(&self.entry(id)?.history)
    }

    pub fn entry(&self, id: ImageId) -> Result<&ImageEntry, CollectionError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(CollectionError::UnknownImage { id })
    }

    fn entry_mut(&mut self, id: ImageId) -> Result<&mut ImageEntry, CollectionError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CollectionError::UnknownImage { id })
    }

    fn index_of(&self, id: ImageId) -> Result<usize, CollectionError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(CollectionError::UnknownImage { id })
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn active(&self) -> Option<ImageId> {
        self.active
    }

    pub fn active_entry(&self) -> Option<&ImageEntry> {
        self.active.and_then(|id| self.entry(id).ok())
    }

    pub fn is_selected(&self, id: ImageId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected ids in display order.
    pub fn selected_ids(&self) -> Vec<ImageId> {
        self.entries
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .map(|e| e.id)
            .collect()
    }

    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("unknown image: {id}")]
    UnknownImage { id: ImageId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str) -> Snapshot {
        Snapshot::upload(name, name.as_bytes().to_vec())
    }

    #[test]
    fn test_first_added_becomes_active_and_selected() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a.png"), "a.png");
        let b = images.add(snap("b.png"), "b.png");

        assert_eq!(images.active(), Some(a));
        assert!(images.is_selected(a));
        assert!(images.is_selected(b));
        assert_eq!(images.selected_ids(), vec![a, b]);
    }

    #[test]
    fn test_identical_names_get_distinct_ids() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("cat.png"), "cat.png");
        let b = images.add(snap("cat.png"), "cat.png");
        assert_ne!(a, b);

        images.append(a, snap("edit.png")).unwrap();
        assert_eq!(images.history(a).unwrap().len(), 2);
        assert_eq!(images.history(b).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_active_reassigns_to_first() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a"), "a");
        let b = images.add(snap("b"), "b");
        let c = images.add(snap("c"), "c");

        images.set_active(c).unwrap();
        images.remove(c).unwrap();
        assert_eq!(images.active(), Some(a));
        assert!(!images.is_selected(c));

        images.remove(a).unwrap();
        assert_eq!(images.active(), Some(b));
    }

    #[test]
    fn test_remove_only_image_clears_active() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a"), "a");
        images.remove(a).unwrap();

        assert_eq!(images.active(), None);
        assert!(!images.is_selected(a));
        assert_eq!(images.selection_count(), 0);
        assert!(images.is_empty());
    }

    #[test]
    fn test_set_active_signals_switch() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a"), "a");
        let b = images.add(snap("b"), "b");

        assert_eq!(images.set_active(a).unwrap(), ActiveSwitch::Unchanged);
        assert_eq!(
            images.set_active(b).unwrap(),
            ActiveSwitch::Switched {
                from: Some(a),
                to: b
            }
        );
        assert_eq!(images.active(), Some(b));
    }

    #[test]
    fn test_selection_operations() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a"), "a");
        let b = images.add(snap("b"), "b");

        assert!(!images.toggle_select(a).unwrap());
        assert_eq!(images.selected_ids(), vec![b]);
        images.deselect_all();
        assert_eq!(images.selection_count(), 0);
        images.select_all();
        assert_eq!(images.selected_ids(), vec![a, b]);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut images = ImageCollection::new();
        let ghost = ImageId::new();
        assert_eq!(
            images.set_active(ghost),
            Err(CollectionError::UnknownImage { id: ghost })
        );
        assert!(images.toggle_select(ghost).is_err());
        assert!(images.snapshot_for(ghost).is_err());
    }

    #[test]
    fn test_snapshot_for_follows_cursor() {
        let mut images = ImageCollection::new();
        let original = snap("a");
        let a = images.add(original.clone(), "a");
        let edited = snap("edited");
        images.append(a, edited.clone()).unwrap();
        assert_eq!(images.snapshot_for(a).unwrap(), &edited);

        images.undo(a).unwrap();
        assert_eq!(images.snapshot_for(a).unwrap(), &original);
    }
}
