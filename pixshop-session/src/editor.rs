//! Application state for one editing session.
//!
//! `Editor` aggregates everything the UI would otherwise keep as loose flags:
//! the image collection, the preview gate, the loading flag, the last error
//! and the transient focus/crop selection. Every user action is one method
//! and one state transition.

use pixshop_ai::{Operation, Transform};
use pixshop_core::{
    is_available, map_to_natural, rasterize_crop, ActiveSwitch, EditMode, ImageCollection,
    ImageId, Point, PreviewGate, Rect, Size, Snapshot, SnapshotId, ViewCache,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::dispatch::{self, Command, DispatchRequest, DispatchResult, Target};
use crate::error::{BatchFailure, EditorError, FailedTarget, Precondition};
use crate::export::{plan_export, ExportPlan};
use crate::EditorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    OwnerRemoved,
    ActiveChanged,
}

/// How a completed dispatch changed the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Single-image result waiting for accept/cancel.
    PreviewReady { owner: ImageId },
    /// Batch results committed straight into these images' histories.
    Committed { updated: Vec<ImageId> },
    /// Single-image result that arrived too late to be shown.
    Discarded { owner: ImageId, reason: DiscardReason },
}

pub struct Editor {
    config: EditorConfig,
    images: ImageCollection,
    preview: PreviewGate,
    loading: bool,
    last_error: Option<String>,
    focus: Option<Point>,
    crop_selection: Option<Rect>,
    views: ViewCache<String>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            images: ImageCollection::new(),
            preview: PreviewGate::default(),
            loading: false,
            last_error: None,
            focus: None,
            crop_selection: None,
            views: ViewCache::new(),
        }
    }

    // --- collection ---------------------------------------------------------

    /// Add uploaded files in order. Returns their new ids.
    pub fn upload<I, N>(&mut self, files: I) -> Vec<ImageId>
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        files
            .into_iter()
            .map(|(name, bytes)| {
                let name = name.into();
                let snapshot = Snapshot::upload(name.clone(), bytes);
                self.images.add(snapshot, name)
            })
            .collect()
    }

    pub fn remove(&mut self, id: ImageId) -> Result<(), EditorError> {
        let was_active = self.images.active() == Some(id);
        self.images.remove(id)?;
        self.preview.discard_for(id);
        if was_active {
            self.clear_transient();
        }
        self.release_views();
        Ok(())
    }

    pub fn set_active(&mut self, id: ImageId) -> Result<ActiveSwitch, EditorError> {
        let switch = self.images.set_active(id)?;
        if let ActiveSwitch::Switched { .. } = switch {
            self.clear_transient();
            self.preview.cancel();
            self.release_views();
        }
        Ok(switch)
    }

    pub fn toggle_select(&mut self, id: ImageId) -> Result<bool, EditorError> {
        Ok(self.images.toggle_select(id)?)
    }

    pub fn select_all(&mut self) {
        self.images.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.images.deselect_all();
    }

    pub fn set_focus(&mut self, point: Option<Point>) {
        self.focus = point;
    }

    /// Crop region in displayed-pixel coordinates.
    pub fn set_crop_selection(&mut self, rect: Option<Rect>) {
        self.crop_selection = rect;
    }

    fn clear_transient(&mut self) {
        self.focus = None;
        self.crop_selection = None;
    }

    // --- history on the active image ----------------------------------------

    pub fn undo(&mut self) -> bool {
        self.on_active(|images, id| images.undo(id).map(|s| s.is_some()))
    }

    pub fn redo(&mut self) -> bool {
        self.on_active(|images, id| images.redo(id).map(|s| s.is_some()))
    }

    pub fn reset(&mut self) -> bool {
        self.on_active(|images, id| images.reset(id).map(|_| true))
    }

    // A pending preview was computed from the old current snapshot, so it goes
    // whenever the active history moves.
    fn on_active(
        &mut self,
        action: impl FnOnce(&mut ImageCollection, ImageId) -> Result<bool, pixshop_core::CollectionError>,
    ) -> bool {
        let Some(id) = self.images.active() else {
            return false;
        };
        let moved = action(&mut self.images, id).unwrap_or(false);
        if moved {
            self.preview.discard_for(id);
            self.release_views();
        }
        moved
    }

    // --- preview ------------------------------------------------------------

    pub fn accept_preview(&mut self) -> Option<ImageId> {
        let owner = self.preview.accept(&mut self.images);
        self.release_views();
        owner
    }

    pub fn cancel_preview(&mut self) {
        self.preview.cancel();
        self.release_views();
    }

    pub fn compare_hold(&mut self, held: bool) {
        self.preview.compare_hold(held);
    }

    /// What the single-image view shows for the active image.
    pub fn displayed_snapshot(&self) -> Option<&Snapshot> {
        let entry = self.images.active_entry()?;
        if self.preview.owner() == Some(entry.id) {
            Some(self.preview.displayed(entry.current()))
        } else {
            Some(entry.current())
        }
    }

    // --- dispatch -----------------------------------------------------------

    /// Check preconditions, capture targets and set the loading flag.
    ///
    /// A single target that is not the active image becomes active here, so
    /// its preview is the one on screen.
    pub fn begin(&mut self, command: Command) -> Result<DispatchRequest, EditorError> {
        let kind = command.name();
        match self.prepare(command) {
            Ok(request) => {
                if let [only] = request.targets.as_slice() {
                    self.bring_forward(only.id)?;
                }
                self.loading = true;
                self.last_error = None;
                tracing::debug!(command = kind, targets = request.targets.len(), "dispatch accepted");
                Ok(request)
            }
            Err(precondition) => {
                tracing::debug!(command = kind, reason = %precondition, "dispatch rejected");
                Err(self.record(EditorError::Precondition(precondition)))
            }
        }
    }

    // No preview can be pending here, prepare refuses that.
    fn bring_forward(&mut self, id: ImageId) -> Result<(), EditorError> {
        if let ActiveSwitch::Switched { from, .. } = self.images.set_active(id)? {
            tracing::debug!(from = ?from, to = %id, "single target became active");
            self.clear_transient();
        }
        Ok(())
    }

    fn prepare(&self, command: Command) -> Result<DispatchRequest, Precondition> {
        if self.loading {
            return Err(Precondition::Busy);
        }
        if self.preview.is_pending() {
            return Err(Precondition::PreviewPending);
        }

        let active = self.images.active();
        let (operation, ids) = match command {
            Command::Retouch { instruction } => {
                let id = active.ok_or(Precondition::NoActiveImage)?;
                let instruction = non_empty(instruction)?;
                let focus = self.focus.ok_or(Precondition::NoFocusPoint)?;
                (Operation::Retouch { instruction, focus }, vec![id])
            }
            Command::Filter { style } => {
                let ids = self.selected()?;
                (Operation::Filter { style: non_empty(style)? }, ids)
            }
            Command::Adjust { instruction } => {
                let ids = self.selected()?;
                let instruction = non_empty(instruction)?;
                (Operation::Adjust { instruction }, ids)
            }
            Command::Upscale { tier } => {
                let ids = self.selected()?;
                if tier.dimensions().is_none() {
                    return Err(Precondition::NoUpscaleTier);
                }
                (Operation::Upscale { tier }, ids)
            }
        };

        let targets = ids
            .into_iter()
            .filter_map(|id| {
                let entry = self.images.entry(id).ok()?;
                Some(Target {
                    id,
                    name: entry.name.clone(),
                    snapshot: entry.current().clone(),
                })
            })
            .collect();

        Ok(DispatchRequest { operation, targets })
    }

    fn selected(&self) -> Result<Vec<ImageId>, Precondition> {
        let ids = self.images.selected_ids();
        if ids.is_empty() {
            return Err(Precondition::NothingSelected);
        }
        Ok(ids)
    }

    /// Apply a settled dispatch by identity and clear the loading flag.
    pub fn complete(&mut self, result: DispatchResult) -> Result<DispatchOutcome, EditorError> {
        self.loading = false;
        let DispatchResult { request, results } = result;
        let op = request.operation.name();

        if !request.is_batch() {
            let Some(single) = results.into_iter().next() else {
                return Ok(DispatchOutcome::Committed { updated: vec![] });
            };
            let snapshot = match single.result {
                Ok(snapshot) => snapshot,
                Err(source) => {
                    tracing::error!(operation = op, image = %single.name, error = %source, "edit failed");
                    return Err(self.record(EditorError::Transform {
                        operation: op,
                        name: single.name,
                        source,
                    }));
                }
            };

            let owner = single.id;
            if !self.images.contains(owner) {
                tracing::warn!(owner = %owner, "edit finished for a removed image, dropping");
                return Ok(DispatchOutcome::Discarded {
                    owner,
                    reason: DiscardReason::OwnerRemoved,
                });
            }
            if self.images.active() != Some(owner) {
                tracing::warn!(owner = %owner, "active image changed during edit, dropping preview");
                return Ok(DispatchOutcome::Discarded {
                    owner,
                    reason: DiscardReason::ActiveChanged,
                });
            }
            self.preview.open(snapshot, owner)?;
            return Ok(DispatchOutcome::PreviewReady { owner });
        }

        let mut updated = Vec::new();
        let mut failed = Vec::new();
        for target in results {
            match target.result {
                Ok(snapshot) => match self.images.append(target.id, snapshot) {
                    Ok(_) => updated.push(target.id),
                    Err(_) => {
                        tracing::warn!(image = %target.name, "batch result for a removed image, dropping")
                    }
                },
                Err(error) => failed.push(FailedTarget {
                    id: target.id,
                    name: target.name,
                    error,
                }),
            }
        }

        tracing::info!(
            operation = op,
            updated = updated.len(),
            failed = failed.len(),
            "batch applied"
        );
        self.release_views();

        if failed.is_empty() {
            Ok(DispatchOutcome::Committed { updated })
        } else {
            Err(self.record(EditorError::Batch(BatchFailure {
                failed,
                succeeded: updated.len(),
            })))
        }
    }

    /// Convenience: begin, run and complete in one call.
    pub async fn dispatch(
        &mut self,
        command: Command,
        transform: Arc<dyn Transform>,
    ) -> Result<DispatchOutcome, EditorError> {
        let request = self.begin(command)?;
        let result = dispatch::run(request, transform).await;
        self.complete(result)
    }

    // --- crop ---------------------------------------------------------------

    /// Rasterize the current crop selection and commit it like a direct edit.
    pub fn apply_crop(
        &mut self,
        displayed: Size,
        natural: Size,
        device_pixel_ratio: f64,
    ) -> Result<usize, EditorError> {
        let outcome = self.crop_active(displayed, natural, device_pixel_ratio);
        outcome.map_err(|e| self.record(e))
    }

    fn crop_active(
        &mut self,
        displayed: Size,
        natural: Size,
        device_pixel_ratio: f64,
    ) -> Result<usize, EditorError> {
        if self.loading {
            return Err(Precondition::Busy.into());
        }
        let id = self.images.active().ok_or(Precondition::NoActiveImage)?;
        let selection = self
            .crop_selection
            .filter(|r| !r.is_empty())
            .ok_or(Precondition::NoCropSelection)?;

        let region = map_to_natural(selection, displayed, natural)?;
        let cropped = rasterize_crop(self.images.snapshot_for(id)?, region, device_pixel_ratio)?;
        let cursor = self.images.append(id, cropped)?;

        self.preview.discard_for(id);
        self.crop_selection = None;
        self.release_views();
        tracing::info!(image_id = %id, cursor, "crop applied");
        Ok(cursor)
    }

    // --- export -------------------------------------------------------------

    pub fn plan_download(&mut self) -> Result<ExportPlan, EditorError> {
        if self.loading {
            return Err(self.record(Precondition::Busy.into()));
        }
        plan_export(&self.images, &self.config.product_name).map_err(|e| self.record(e.into()))
    }

    // --- views --------------------------------------------------------------

    /// Viewable handle for whatever the active image currently displays.
    pub fn active_view(&mut self) -> Option<&str> {
        let snapshot = self.displayed_snapshot()?.clone();
        Some(self.views.get_or_insert_with(&snapshot, Snapshot::data_url).as_str())
    }

    /// Release handles whose snapshots left every history and the preview.
    /// Every transition that can drop a snapshot already does this.
    pub fn refresh_views(&mut self) -> Vec<String> {
        let reachable = self.reachable_snapshots();
        self.views.release_unreachable(&reachable)
    }

    fn release_views(&mut self) {
        let released = self.refresh_views();
        if !released.is_empty() {
            tracing::debug!(released = released.len(), "view handles released");
        }
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn reachable_snapshots(&self) -> HashSet<SnapshotId> {
        let mut reachable: HashSet<SnapshotId> = self
            .images
            .entries()
            .iter()
            .flat_map(|e| {
                e.history
                    .entries()
                    .iter()
                    .chain(std::iter::once(e.original()))
                    .map(Snapshot::id)
            })
            .collect();
        if let Some(pending) = self.preview.pending() {
            reachable.insert(pending.id());
        }
        reachable
    }

    // --- state --------------------------------------------------------------

    fn record(&mut self, error: EditorError) -> EditorError {
        self.last_error = Some(error.to_string());
        error
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_mode_available(&self, mode: EditMode) -> bool {
        is_available(mode, self.images.selection_count())
    }

    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    pub fn preview(&self) -> &PreviewGate {
        &self.preview
    }

    pub fn focus(&self) -> Option<Point> {
        self.focus
    }

    pub fn crop_selection(&self) -> Option<Rect> {
        self.crop_selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn non_empty(text: String) -> Result<String, Precondition> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Precondition::EmptyInstruction);
    }
    Ok(trimmed.to_string())
}
