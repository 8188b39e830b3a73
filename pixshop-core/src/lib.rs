//! pixshop-core: edit-history model for a multi-image photo editor.
//!
//! Design rules:
//! - Snapshots are immutable; history only grows by append or shrinks by branch truncation.
//! - A history is never empty and its cursor is always valid.
//! - All history mutation funnels through `ImageCollection`.
//! - Active id and selection never reference a removed image.

pub mod collection;
pub mod crop;
pub mod geometry;
pub mod history;
pub mod mode;
pub mod preview;
pub mod snapshot;
pub mod view;

pub use collection::{ActiveSwitch, CollectionError, ImageCollection, ImageEntry, ImageId};
pub use crop::{map_to_natural, rasterize_crop, CropError, MAX_PIXEL_RATIO};
pub use geometry::{Point, Rect, Size};
pub use history::History;
pub use mode::{available_modes, is_available, EditMode};
pub use preview::{PreviewError, PreviewGate};
pub use snapshot::{EditKind, Snapshot, SnapshotId, SnapshotOrigin, UpscaleTier};
pub use view::ViewCache;
