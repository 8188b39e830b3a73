// Editing modes and when they can be used.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    Retouch,
    Crop,
    Adjust,
    Filters,
    Upscale,
}

impl EditMode {
    pub const ALL: [EditMode; 5] = [
        EditMode::Retouch,
        EditMode::Crop,
        EditMode::Adjust,
        EditMode::Filters,
        EditMode::Upscale,
    ];

    /// Modes that act on the active image only.
    pub fn is_single_image(&self) -> bool {
        matches!(self, EditMode::Retouch | EditMode::Crop)
    }
}

/// Central capability predicate. Single-image modes are hidden once more than
/// one image is selected; batch modes stay available and the dispatcher
/// reports an empty selection itself.
pub fn is_available(mode: EditMode, selection_count: usize) -> bool {
    if mode.is_single_image() {
        selection_count <= 1
    } else {
        true
    }
}

pub fn available_modes(selection_count: usize) -> Vec<EditMode> {
    EditMode::ALL
        .into_iter()
        .filter(|mode| is_available(*mode, selection_count))
        .collect()
}
