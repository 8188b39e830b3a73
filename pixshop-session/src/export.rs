//! Bulk export planning.
//!
//! Decides what a download action produces: one file for a single selected
//! image, one archive for several. Writing the archive bytes is left to the
//! caller.

use pixshop_core::{ImageCollection, ImageEntry, ImageId, Snapshot};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub id: ImageId,
    pub file_name: String,
    pub snapshot: Snapshot,
    pub upscaled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportPlan {
    Single(ExportFile),
    Archive { name: String, files: Vec<ExportFile> },
}

impl ExportPlan {
    pub fn files(&self) -> &[ExportFile] {
        match self {
            ExportPlan::Single(file) => std::slice::from_ref(file),
            ExportPlan::Archive { files, .. } => files,
        }
    }
}

pub fn export_file_name(entry: &ImageEntry) -> (String, bool) {
    let upscaled = entry.history.ever_applied(|s| s.origin().is_upscale());
    let prefix = if upscaled { "upscaled-4k" } else { "edited" };
    (format!("{prefix}-{}", entry.name), upscaled)
}

pub fn archive_name(product: &str, upscaled: bool) -> String {
    if upscaled {
        format!("{product}-upscaled-edits.zip")
    } else {
        format!("{product}-edits.zip")
    }
}

/// Plan the download of every selected image's current snapshot.
pub fn plan_export(images: &ImageCollection, product: &str) -> Result<ExportPlan, ExportError> {
    let mut files = Vec::new();
    for id in images.selected_ids() {
        let entry = images.entry(id).map_err(|_| ExportError::UnknownImage { id })?;
        let (file_name, upscaled) = export_file_name(entry);
        files.push(ExportFile {
            id,
            file_name,
            snapshot: entry.current().clone(),
            upscaled,
        });
    }

    match files.len() {
        0 => Err(ExportError::NothingSelected),
        1 => {
            let file = files.remove(0);
            tracing::info!(file = %file.file_name, "export planned as single file");
            Ok(ExportPlan::Single(file))
        }
        count => {
            let name = archive_name(product, files.iter().any(|f| f.upscaled));
            tracing::info!(archive = %name, count, "export planned as archive");
            Ok(ExportPlan::Archive { name, files })
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("select at least one image to download")]
    NothingSelected,

    #[error("unknown image in selection: {id}")]
    UnknownImage { id: ImageId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixshop_core::{EditKind, SnapshotOrigin, UpscaleTier};

    fn snap(name: &str) -> Snapshot {
        Snapshot::upload(name, name.as_bytes().to_vec())
    }

    fn upscaled(name: &str) -> Snapshot {
        Snapshot::new(
            name,
            "image/png",
            vec![1u8],
            SnapshotOrigin::Edit(EditKind::Upscale(UpscaleTier::P2160)),
        )
    }

    #[test]
    fn test_single_selection_is_direct_file() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a.png"), "a.png");
        let plan = plan_export(&images, "pixshop").unwrap();
        match plan {
            ExportPlan::Single(file) => {
                assert_eq!(file.id, a);
                assert_eq!(file.file_name, "edited-a.png");
            }
            other => panic!("expected single file, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_selection_is_archive() {
        let mut images = ImageCollection::new();
        images.add(snap("a.png"), "a.png");
        images.add(snap("b.png"), "b.png");
        let plan = plan_export(&images, "pixshop").unwrap();
        match &plan {
            ExportPlan::Archive { name, files } => {
                assert_eq!(name, "pixshop-edits.zip");
                assert_eq!(files.len(), 2);
            }
            other => panic!("expected archive, got {other:?}"),
        }
        assert_eq!(plan.files()[1].file_name, "edited-b.png");
    }

    #[test]
    fn test_upscaled_naming() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a.png"), "a.png");
        images.add(snap("b.png"), "b.png");
        images.append(a, upscaled("a.png")).unwrap();

        let plan = plan_export(&images, "pixshop").unwrap();
        let ExportPlan::Archive { name, files } = plan else {
            panic!("expected archive");
        };
        assert_eq!(name, "pixshop-upscaled-edits.zip");
        assert_eq!(files[0].file_name, "upscaled-4k-a.png");
        assert_eq!(files[1].file_name, "edited-b.png");
    }

    #[test]
    fn test_undone_upscale_not_counted() {
        let mut images = ImageCollection::new();
        let a = images.add(snap("a.png"), "a.png");
        images.append(a, upscaled("a.png")).unwrap();
        images.undo(a).unwrap();

        let plan = plan_export(&images, "pixshop").unwrap();
        assert_eq!(plan.files()[0].file_name, "edited-a.png");
    }

    #[test]
    fn test_empty_selection() {
        let mut images = ImageCollection::new();
        images.add(snap("a.png"), "a.png");
        images.deselect_all();
        assert_eq!(plan_export(&images, "pixshop"), Err(ExportError::NothingSelected));
    }
}
