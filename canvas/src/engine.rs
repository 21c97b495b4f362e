use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::CanvasConfig;
use crate::doc::{AnnotationRegion, BoundingBox, RegionId};
use crate::hit::{self, HitPart};
use crate::input::{Button, EditGesture, EditKind, InteractionState, Key};
use crate::lifecycle::{CanvasLifecycle, Image, ImageLoader, ImageSource, LoadDecision, LoadError, LoadOutcome, PendingLoad};
use crate::mapper::{CoordinateMapper, Point, Rect};
use crate::overlay::{self, Scene, SyncReport};
use crate::render::Surface;
use crate::viewport::{ContainerBounds, DisplaySize, ViewState};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine handlers for the owner to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Action {
    /// A manual region was drawn. The owner appends it to its list.
    RegionCreated(AnnotationRegion),
    /// A move or resize gesture finished with new image-space geometry.
    RegionUpdated { id: RegionId, bbox: BoundingBox },
    /// Selection changed from the canvas side.
    RegionSelected(Option<RegionId>),
    /// The applied (clamped) zoom factor changed.
    ZoomChanged(f64),
    /// A load was committed as the new background.
    ImageLoaded { generation: u64, width: u32, height: u32 },
    /// The latest load failed. The canvas keeps showing what it had.
    LoadFailed { generation: u64, message: String },
    RenderNeeded,
}

/// Core engine state: all logic that does not depend on a drawing surface.
///
/// Separated from [`Engine`] so it can be tested without surfaces or loaders.
/// The region list and selection id mirror the owner's state; the engine
/// never edits its copy of the list, it only reports change requests.
#[derive(Debug)]
pub struct EngineCore {
    config: CanvasConfig,
    regions: Vec<AnnotationRegion>,
    selected: Option<RegionId>,
    busy: bool,
    container: ContainerBounds,
    zoom: f64,
    view: Option<ViewState>,
    mapper: CoordinateMapper,
    scene: Scene,
    input: InteractionState,
    last_sync: SyncReport,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            regions: Vec::new(),
            selected: None,
            busy: false,
            container: ContainerBounds::default(),
            zoom: 1.0,
            view: None,
            mapper: CoordinateMapper::default(),
            scene: Scene::new(),
            input: InteractionState::Idle,
            last_sync: SyncReport::default(),
        }
    }

    // --- Owner inputs ---

    /// Replace the mirrored region list and rebuild overlays.
    pub fn set_regions(&mut self, regions: Vec<AnnotationRegion>) -> Vec<Action> {
        self.regions = regions;
        if let InteractionState::Selected { id, edit: Some(_) } = &self.input {
            if !self.regions.iter().any(|r| &r.id == id) {
                self.input = InteractionState::resting(self.selected.as_ref());
            }
        }
        self.resync();
        // Keep an in-flight edit previewed over the rebuilt overlays.
        if let InteractionState::Selected { id, edit: Some(gesture) } = &self.input {
            self.scene.preview_overlay(id, gesture.current);
        }
        vec![Action::RenderNeeded]
    }

    /// Highlight the region the owner selected. Emits no selection event back.
    pub fn set_selected(&mut self, id: Option<RegionId>) -> Vec<Action> {
        if self.selected == id {
            return Vec::new();
        }
        self.selected = id;
        if !self.input.is_drawing() {
            self.input = InteractionState::resting(self.selected.as_ref());
        }
        self.resync();
        vec![Action::RenderNeeded]
    }

    /// Declare the owner busy. Switching busy on cancels any gesture in flight.
    pub fn set_busy(&mut self, busy: bool) -> Vec<Action> {
        self.busy = busy;
        if busy && self.input.in_gesture() {
            debug!("busy: cancelling gesture");
            self.cancel_gesture();
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    /// Update the available container size and refit the loaded image.
    pub fn set_container(&mut self, container: ContainerBounds) -> Vec<Action> {
        self.container = container;
        let Some(view) = self.view else {
            return Vec::new();
        };
        self.cancel_gesture();
        self.install_view(ViewState::fitted(view.image, container, self.zoom, &self.config));
        vec![Action::RenderNeeded]
    }

    /// Explicit deselection.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.selected.is_none() {
            return Vec::new();
        }
        self.selected = None;
        if !self.input.is_drawing() {
            self.input = InteractionState::Idle;
        }
        self.resync();
        vec![Action::RegionSelected(None), Action::RenderNeeded]
    }

    // --- Zoom ---

    /// Clamp and apply a zoom factor. Region image-space geometry never changes.
    pub fn set_zoom(&mut self, factor: f64) -> Vec<Action> {
        let applied = self.config.clamp_zoom(factor);
        if (applied - factor).abs() > f64::EPSILON {
            debug!(requested = factor, applied, "zoom clamped");
        }
        if (applied - self.zoom).abs() <= f64::EPSILON {
            return Vec::new();
        }
        self.zoom = applied;
        self.cancel_gesture();
        if let Some(mut view) = self.view {
            view.zoom = applied;
            self.install_view(view);
        }
        vec![Action::ZoomChanged(applied), Action::RenderNeeded]
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.set_zoom(self.zoom * self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.set_zoom(self.zoom / self.config.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.set_zoom(1.0)
    }

    // --- Image ---

    /// Install a freshly committed image: clear the canvas, fit, remap, resync.
    pub fn commit_image(&mut self, image: Arc<Image>) -> Vec<Action> {
        let size = image.size();
        self.cancel_gesture();
        self.scene.clear();
        self.scene.set_background(Arc::clone(&image));
        self.install_view(ViewState::fitted(size, self.container, self.zoom, &self.config));
        vec![
            Action::ImageLoaded { generation: image.generation(), width: size.width, height: size.height },
            Action::RenderNeeded,
        ]
    }

    /// Forget the image and every overlay.
    pub fn unload(&mut self) {
        self.input = InteractionState::Idle;
        self.scene.clear();
        self.view = None;
        self.mapper = CoordinateMapper::default();
        self.last_sync = SyncReport::default();
    }

    // --- Pointer and keyboard ---

    pub fn on_pointer_down(&mut self, pt: Point, button: Button) -> Vec<Action> {
        if !self.accepts_pointer(button) || self.input.in_gesture() {
            return Vec::new();
        }

        let Some(hit) = hit::hit_test(pt, &self.scene, self.selected.as_ref(), self.config.handle_radius_px) else {
            return self.begin_drawing(pt);
        };

        let mut actions = Vec::new();
        if self.selected.as_ref() != Some(&hit.region_id) {
            self.selected = Some(hit.region_id.clone());
            self.resync();
            actions.push(Action::RegionSelected(Some(hit.region_id.clone())));
        }
        let Some(orig) = self.scene.overlay(&hit.region_id).map(|o| o.rect) else {
            self.input = InteractionState::resting(self.selected.as_ref());
            actions.push(Action::RenderNeeded);
            return actions;
        };
        let kind = match hit.part {
            HitPart::Body => EditKind::Move,
            HitPart::ResizeHandle(anchor) => EditKind::Resize(anchor),
        };
        self.input = InteractionState::Selected { id: hit.region_id, edit: Some(EditGesture::new(kind, pt, orig)) };
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        if self.busy {
            return Vec::new();
        }
        match &mut self.input {
            InteractionState::Drawing { origin, rect } => {
                *rect = Rect::from_corners(*origin, pt);
                self.scene.set_transient(Some(*rect));
                vec![Action::RenderNeeded]
            }
            InteractionState::Selected { id, edit: Some(gesture) } => {
                let preview = gesture.update(pt);
                self.scene.preview_overlay(id, preview);
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        match std::mem::take(&mut self.input) {
            InteractionState::Drawing { origin, .. } => {
                self.scene.set_transient(None);
                self.input = InteractionState::Idle;
                self.finish_drawing(Rect::from_corners(origin, pt))
            }
            InteractionState::Selected { id, edit: Some(mut gesture) } => {
                gesture.update(pt);
                self.input = InteractionState::Selected { id: id.clone(), edit: None };
                self.finish_edit(&id, &gesture)
            }
            resting => {
                self.input = resting;
                Vec::new()
            }
        }
    }

    /// `Escape` cancels a gesture in flight, or clears the selection when idle.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if !key.is_escape() {
            return Vec::new();
        }
        if self.input.in_gesture() {
            self.cancel_gesture();
            return vec![Action::RenderNeeded];
        }
        self.clear_selection()
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[must_use]
    pub fn regions(&self) -> &[AnnotationRegion] {
        &self.regions
    }

    #[must_use]
    pub fn selection(&self) -> Option<&RegionId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    /// Current display size, or `None` before the first image is committed.
    #[must_use]
    pub fn display_size(&self) -> Option<DisplaySize> {
        self.view.map(|v| v.display_size())
    }

    #[must_use]
    pub fn mapper(&self) -> CoordinateMapper {
        self.mapper
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.input
    }

    /// Counters from the most recent overlay sync.
    #[must_use]
    pub fn last_sync(&self) -> SyncReport {
        self.last_sync
    }

    // --- Internals ---

    fn accepts_pointer(&self, button: Button) -> bool {
        !self.busy && self.view.is_some() && button == Button::Primary
    }

    fn begin_drawing(&mut self, pt: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.selected.take().is_some() {
            self.resync();
            actions.push(Action::RegionSelected(None));
        }
        self.input = InteractionState::drawing(pt);
        self.scene.set_transient(Some(Rect::at(pt)));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn finish_drawing(&mut self, rect: Rect) -> Vec<Action> {
        let min = self.config.min_draw_size_px;
        if rect.width < min || rect.height < min {
            debug!(width = rect.width, height = rect.height, "discarding undersized drawing");
            return vec![Action::RenderNeeded];
        }
        let Some(bbox) = self.to_image_bbox(&rect) else {
            debug!(?rect, "discarding drawing outside the image");
            return vec![Action::RenderNeeded];
        };
        let region = AnnotationRegion::manual(bbox);
        info!(id = %region.id, ?bbox, "region drawn");
        vec![Action::RegionCreated(region), Action::RenderNeeded]
    }

    fn finish_edit(&mut self, id: &RegionId, gesture: &EditGesture) -> Vec<Action> {
        let original = self.regions.iter().find(|r| &r.id == id).map(|r| r.bbox);
        // Snap the preview back; the owner's update brings the new geometry.
        self.resync();
        if gesture.current == gesture.orig {
            return vec![Action::RenderNeeded];
        }
        match self.to_image_bbox(&gesture.current) {
            Some(bbox) if original != Some(bbox) => {
                debug!(%id, ?bbox, "region edited");
                vec![Action::RegionUpdated { id: id.clone(), bbox }, Action::RenderNeeded]
            }
            _ => vec![Action::RenderNeeded],
        }
    }

    /// Image-space box of a display rectangle, clamped to the image. `None` if degenerate.
    fn to_image_bbox(&self, rect: &Rect) -> Option<BoundingBox> {
        let view = self.view?;
        let bbox = self.mapper.rect_to_image(rect).clamp_to(view.image.width, view.image.height);
        bbox.is_valid().then_some(bbox)
    }

    fn cancel_gesture(&mut self) {
        let was_editing = self.input.is_editing();
        self.scene.set_transient(None);
        self.input = InteractionState::resting(self.selected.as_ref());
        if was_editing {
            self.resync();
        }
    }

    fn install_view(&mut self, view: ViewState) {
        self.mapper = view.mapper();
        self.view = Some(view);
        self.resync();
    }

    /// Full overlay rebuild. Without an image there is nothing to overlay.
    fn resync(&mut self) {
        let regions: &[AnnotationRegion] = if self.view.is_some() { &self.regions } else { &[] };
        self.last_sync = overlay::sync(&mut self.scene, regions, self.selected.as_ref(), &self.mapper);
    }
}

// =============================================================
// Engine
// =============================================================

/// The full canvas engine. Wraps [`EngineCore`] and exclusively owns the
/// drawing surface and the image lifecycle.
///
/// Every handler returns the core's actions after presenting the frame when
/// one of them is [`Action::RenderNeeded`].
pub struct Engine<S, L> {
    pub core: EngineCore,
    surface: S,
    lifecycle: CanvasLifecycle<L>,
    surface_size: Option<(u32, u32)>,
}

impl<S: Surface, L: ImageLoader> Engine<S, L> {
    #[must_use]
    pub fn new(config: CanvasConfig, surface: S, loader: L) -> Self {
        Self { core: EngineCore::new(config), surface, lifecycle: CanvasLifecycle::new(loader), surface_size: None }
    }

    // --- Image lifecycle ---

    /// Start loading `source`. Any earlier pending load becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Released`] after [`teardown`](Self::teardown).
    pub fn begin_load(&mut self, source: ImageSource) -> Result<PendingLoad<L>, LoadError> {
        self.lifecycle.begin(source)
    }

    /// Settle a resolved load against the current generation.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Vec<Action> {
        match self.lifecycle.settle(outcome) {
            LoadDecision::Commit(image) => {
                let actions = self.core.commit_image(image);
                self.present(actions)
            }
            LoadDecision::Failed { generation, error } => {
                vec![Action::LoadFailed { generation, message: error.to_string() }]
            }
            LoadDecision::Stale { .. } => Vec::new(),
        }
    }

    /// Load and commit in one step. Use [`begin_load`](Self::begin_load) and
    /// [`finish_load`](Self::finish_load) to overlap loads.
    pub async fn load_image(&mut self, source: ImageSource) -> Vec<Action> {
        match self.begin_load(source) {
            Ok(pending) => {
                let outcome = pending.resolve().await;
                self.finish_load(outcome)
            }
            Err(error) => vec![Action::LoadFailed { generation: self.lifecycle.generation(), message: error.to_string() }],
        }
    }

    /// Release the surface and invalidate pending loads. The engine stays inert afterwards.
    pub fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.core.unload();
        self.surface.release();
        self.surface_size = None;
        info!("canvas torn down");
    }

    // --- Delegated inputs ---

    pub fn set_regions(&mut self, regions: Vec<AnnotationRegion>) -> Vec<Action> {
        let actions = self.core.set_regions(regions);
        self.present(actions)
    }

    pub fn set_selected(&mut self, id: Option<RegionId>) -> Vec<Action> {
        let actions = self.core.set_selected(id);
        self.present(actions)
    }

    pub fn set_busy(&mut self, busy: bool) -> Vec<Action> {
        let actions = self.core.set_busy(busy);
        self.present(actions)
    }

    pub fn set_container(&mut self, container: ContainerBounds) -> Vec<Action> {
        let actions = self.core.set_container(container);
        self.present(actions)
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        let actions = self.core.clear_selection();
        self.present(actions)
    }

    pub fn set_zoom(&mut self, factor: f64) -> Vec<Action> {
        let actions = self.core.set_zoom(factor);
        self.present(actions)
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_in();
        self.present(actions)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_out();
        self.present(actions)
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        let actions = self.core.reset_zoom();
        self.present(actions)
    }

    pub fn on_pointer_down(&mut self, pt: Point, button: Button) -> Vec<Action> {
        let actions = self.core.on_pointer_down(pt, button);
        self.present(actions)
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.core.on_pointer_move(pt);
        self.present(actions)
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button) -> Vec<Action> {
        let actions = self.core.on_pointer_up(pt, button);
        self.present(actions)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        let actions = self.core.on_key_down(key);
        self.present(actions)
    }

    // --- Rendering ---

    /// Resize the surface to the current display size if needed, then draw.
    pub fn render(&mut self) {
        if self.lifecycle.is_released() {
            return;
        }
        if let Some(size) = self.core.display_size() {
            let target = surface_pixels(size);
            if self.surface_size != Some(target) {
                self.surface.resize(target.0, target.1);
                self.surface_size = Some(target);
            }
        }
        self.surface.draw(self.core.scene());
    }

    fn present(&mut self, actions: Vec<Action>) -> Vec<Action> {
        if actions.contains(&Action::RenderNeeded) {
            self.render();
        }
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn lifecycle(&self) -> &CanvasLifecycle<L> {
        &self.lifecycle
    }

    #[must_use]
    pub fn image(&self) -> Option<&Arc<Image>> {
        self.lifecycle.current()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn surface_pixels(size: DisplaySize) -> (u32, u32) {
    (size.width.round().max(1.0) as u32, size.height.round().max(1.0) as u32)
}
