//! Holds at most one uncommitted single-image edit result.

use thiserror::Error;

use crate::{ImageCollection, ImageId, Snapshot};

#[derive(Debug, Clone, Default)]
pub enum PreviewGate {
    #[default]
    Empty,
    Pending {
        snapshot: Snapshot,
        owner: ImageId,
        compare_held: bool,
    },
}

impl PreviewGate {
    pub fn open(&mut self, snapshot: Snapshot, owner: ImageId) -> Result<(), PreviewError> {
        if let PreviewGate::Pending { owner: existing, .. } = self {
            tracing::error!(existing = %existing, incoming = %owner, "preview already pending");
            return Err(PreviewError::AlreadyPending { owner: *existing });
        }
        tracing::info!(owner = %owner, snapshot = %snapshot.id(), "preview opened");
        *self = PreviewGate::Pending {
            snapshot,
            owner,
            compare_held: false,
        };
        Ok(())
    }

    /// Commit the pending snapshot into its owner's history. Returns the owner
    /// it was committed to, or `None` if nothing was pending or the owner is gone.
    pub fn accept(&mut self, images: &mut ImageCollection) -> Option<ImageId> {
        let PreviewGate::Pending { snapshot, owner, .. } = std::mem::take(self) else {
            return None;
        };
        match images.append(owner, snapshot) {
            Ok(_) => {
                tracing::info!(owner = %owner, "preview accepted");
                Some(owner)
            }
            Err(err) => {
                tracing::warn!(owner = %owner, error = %err, "preview owner vanished, dropping result");
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        if let PreviewGate::Pending { owner, .. } = std::mem::take(self) {
            tracing::info!(owner = %owner, "preview cancelled");
        }
    }

    /// Clear the gate if it belongs to `id`.
    pub fn discard_for(&mut self, id: ImageId) {
        if self.owner() == Some(id) {
            self.cancel();
        }
    }

    /// While held, the pre-edit snapshot is displayed instead of the pending one.
    pub fn compare_hold(&mut self, held: bool) {
        if let PreviewGate::Pending { compare_held, .. } = self {
            *compare_held = held;
        }
    }

    /// What should be on screen given the owner's current committed snapshot.
    pub fn displayed<'a>(&'a self, current: &'a Snapshot) -> &'a Snapshot {
        match self {
            PreviewGate::Pending {
                snapshot,
                compare_held: false,
                ..
            } => snapshot,
            _ => current,
        }
    }

    pub fn pending(&self) -> Option<&Snapshot> {
        match self {
            PreviewGate::Pending { snapshot, .. } => Some(snapshot),
            PreviewGate::Empty => None,
        }
    }

    pub fn owner(&self) -> Option<ImageId> {
        match self {
            PreviewGate::Pending { owner, .. } => Some(*owner),
            PreviewGate::Empty => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PreviewGate::Pending { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("a preview for image {owner} is already pending")]
    AlreadyPending { owner: ImageId },
}
