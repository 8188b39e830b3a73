//! Errors surfaced to the user by editor actions.

use pixshop_ai::TransformError;
use pixshop_core::{CollectionError, CropError, ImageId, PreviewError};
use thiserror::Error;

use crate::export::ExportError;

/// Checked before any network call. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("another operation is still running")]
    Busy,

    #[error("no image loaded to edit")]
    NoActiveImage,

    #[error("please enter a description for your edit")]
    EmptyInstruction,

    #[error("please click on the image to select an area to edit")]
    NoFocusPoint,

    #[error("select at least one image")]
    NothingSelected,

    #[error("choose a target resolution to upscale to")]
    NoUpscaleTier,

    #[error("accept or discard the pending preview first")]
    PreviewPending,

    #[error("draw a crop region first")]
    NoCropSelection,
}

/// One target of a batch that did not come back with an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTarget {
    pub id: ImageId,
    pub name: String,
    pub error: TransformError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub failed: Vec<FailedTarget>,
    pub succeeded: usize,
}

impl BatchFailure {
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.name.as_str()).collect()
    }
}

impl std::fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to process {} image(s): {}",
            self.failed.len(),
            self.failed_names().join(", ")
        )?;
        if self.succeeded > 0 {
            write!(f, ". The other {} image(s) were updated", self.succeeded)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Precondition(#[from] Precondition),

    #[error("failed to {operation} {name}: {source}")]
    Transform {
        operation: &'static str,
        name: String,
        #[source]
        source: TransformError,
    },

    #[error("{0}")]
    Batch(BatchFailure),

    #[error("crop failed: {0}")]
    Crop(#[from] CropError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
