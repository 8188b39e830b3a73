//! Immutable encoded image payloads.
//!
//! A snapshot is one point in an image's edit history. It is created by an
//! upload, a successful transform or a crop, and is never mutated afterwards.
//! Cloning is cheap: the payload is shared.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a single snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target resolution tiers offered for upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpscaleTier {
    Original,
    P720,
    P1080,
    P1440,
    P2160,
}

impl UpscaleTier {
    pub const ALL: [UpscaleTier; 5] = [
        UpscaleTier::Original,
        UpscaleTier::P720,
        UpscaleTier::P1080,
        UpscaleTier::P1440,
        UpscaleTier::P2160,
    ];

    /// Explicit pixel dimensions (width, height). `Original` keeps the source size.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            UpscaleTier::Original => None,
            UpscaleTier::P720 => Some((1280, 720)),
            UpscaleTier::P1080 => Some((1920, 1080)),
            UpscaleTier::P1440 => Some((2560, 1440)),
            UpscaleTier::P2160 => Some((3840, 2160)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpscaleTier::Original => "original",
            UpscaleTier::P720 => "720p",
            UpscaleTier::P1080 => "1080p",
            UpscaleTier::P1440 => "1440p",
            UpscaleTier::P2160 => "2160p",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for UpscaleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which kind of remote edit produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Retouch,
    Filter,
    Adjust,
    Upscale(UpscaleTier),
}

/// How a snapshot came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    Upload,
    Edit(EditKind),
    Crop,
}

impl SnapshotOrigin {
    pub fn is_upscale(&self) -> bool {
        matches!(self, SnapshotOrigin::Edit(EditKind::Upscale(_)))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: SnapshotId,
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
    origin: SnapshotOrigin,
}

impl Snapshot {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        origin: SnapshotOrigin,
    ) -> Self {
        Self {
            id: SnapshotId::new(),
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
            origin,
        }
    }

    /// Snapshot for a freshly uploaded file. The MIME type is guessed from the extension.
    pub fn upload(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = mime_from_name(&name);
        Self::new(name, mime, bytes, SnapshotOrigin::Upload)
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Viewable `data:` URL for the payload.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

// Payloads can be megabytes; keep them out of debug output.
impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("origin", &self.origin)
            .finish()
    }
}

pub fn mime_from_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_guesses_mime() {
        let snap = Snapshot::upload("holiday.JPG", vec![1u8, 2, 3]);
        assert_eq!(snap.mime(), "image/jpeg");
        assert_eq!(snap.origin(), SnapshotOrigin::Upload);
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn test_clone_shares_identity() {
        let snap = Snapshot::upload("a.png", vec![0u8; 4]);
        let copy = snap.clone();
        assert_eq!(snap.id(), copy.id());
        assert_eq!(snap, copy);
    }

    #[test]
    fn test_data_url() {
        let snap = Snapshot::new("x.png", "image/png", vec![0u8, 1, 2], SnapshotOrigin::Upload);
        assert_eq!(snap.data_url(), "data:image/png;base64,AAEC");
    }

    #[test]
    fn test_upscale_tier_dimensions() {
        assert_eq!(UpscaleTier::Original.dimensions(), None);
        assert_eq!(UpscaleTier::P720.dimensions(), Some((1280, 720)));
        assert_eq!(UpscaleTier::P1080.dimensions(), Some((1920, 1080)));
        assert_eq!(UpscaleTier::P1440.dimensions(), Some((2560, 1440)));
        assert_eq!(UpscaleTier::P2160.dimensions(), Some((3840, 2160)));
        assert_eq!(UpscaleTier::parse("1080P"), Some(UpscaleTier::P1080));
        assert_eq!(UpscaleTier::parse("8k"), None);
    }
}
