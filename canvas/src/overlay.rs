//! Region overlays: the graphical mirror of the region list.
//!
//! The [`Scene`] is everything a surface draws: the background image, one
//! overlay per visible region, and the transient rectangle of an in-progress
//! drawing gesture. [`sync`] rebuilds the region overlays from scratch on
//! every change to the region list, the selection or the mapper scale. Region
//! counts are in the tens, so there is no incremental diffing.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::sync::Arc;

use serde::Serialize;
use tracing::{trace, warn};

use crate::consts::{OVERLAY_DASH_PX, OVERLAY_FILL_RGBA, STROKE_DEFAULT_RGBA, STROKE_SELECTED_RGBA};
use crate::doc::{AnnotationRegion, RegionId};
use crate::lifecycle::Image;
use crate::mapper::{CoordinateMapper, Rect};

/// How an overlay is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStyle {
    /// Unselected region: solid accent stroke.
    Default,
    /// The selected region: dashed highlight stroke.
    Selected,
    /// The rubber band of a drawing gesture: dashed accent stroke.
    Drawing,
}

impl OverlayStyle {
    #[must_use]
    pub fn stroke_rgba(self) -> [u8; 4] {
        match self {
            Self::Default | Self::Drawing => STROKE_DEFAULT_RGBA,
            Self::Selected => STROKE_SELECTED_RGBA,
        }
    }

    #[must_use]
    pub fn fill_rgba(self) -> [u8; 4] {
        OVERLAY_FILL_RGBA
    }

    /// Dash length, or `None` for a solid stroke.
    #[must_use]
    pub fn dash(self) -> Option<f64> {
        match self {
            Self::Default => None,
            Self::Selected | Self::Drawing => Some(OVERLAY_DASH_PX),
        }
    }
}

/// The graphical representation of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub region_id: RegionId,
    /// Display-space geometry.
    pub rect: Rect,
    pub style: OverlayStyle,
}

/// The background raster, drawn beneath all overlays and never hit-tested.
#[derive(Debug, Clone)]
pub struct Background {
    pub image: Arc<Image>,
}

/// Everything the surface draws, in stacking order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    background: Option<Background>,
    overlays: Vec<Overlay>,
    transient: Option<Rect>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything: background, overlays and transient rectangle.
    pub fn clear(&mut self) {
        self.background = None;
        self.overlays.clear();
        self.transient = None;
    }

    pub fn set_background(&mut self, image: Arc<Image>) {
        self.background = Some(Background { image });
    }

    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Region overlays, bottom first.
    #[must_use]
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    #[must_use]
    pub fn overlay(&self, id: &RegionId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| &o.region_id == id)
    }

    /// Move an overlay without touching the region it mirrors (gesture preview).
    pub fn preview_overlay(&mut self, id: &RegionId, rect: Rect) -> bool {
        let Some(overlay) = self.overlays.iter_mut().find(|o| &o.region_id == id) else {
            return false;
        };
        overlay.rect = rect;
        true
    }

    /// The rubber band of an in-progress drawing, if any.
    #[must_use]
    pub fn transient(&self) -> Option<Rect> {
        self.transient
    }

    pub fn set_transient(&mut self, rect: Option<Rect>) {
        self.transient = rect;
    }

    /// Number of overlays currently styled as selected.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.overlays
            .iter()
            .filter(|o| o.style == OverlayStyle::Selected)
            .count()
    }
}

/// Outcome counters of one sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub rendered: usize,
    pub hidden: usize,
    pub invalid: usize,
}

/// Rebuild all region overlays from the authoritative list.
///
/// Hidden regions get no overlay. Regions with `x1 >= x2` or `y1 >= y2` are
/// skipped. The background and transient rectangle are left alone.
pub fn sync(
    scene: &mut Scene,
    regions: &[AnnotationRegion],
    selected: Option<&RegionId>,
    mapper: &CoordinateMapper,
) -> SyncReport {
    scene.overlays.clear();
    let mut report = SyncReport::default();

    for region in regions {
        if !region.visible {
            report.hidden += 1;
            continue;
        }
        if !region.bbox.is_valid() {
            warn!(id = %region.id, bbox = ?region.bbox, "skipping region with invalid geometry");
            report.invalid += 1;
            continue;
        }
        let style = if selected == Some(&region.id) { OverlayStyle::Selected } else { OverlayStyle::Default };
        scene.overlays.push(Overlay {
            region_id: region.id.clone(),
            rect: mapper.bbox_to_display(&region.bbox),
            style,
        });
        report.rendered += 1;
    }

    trace!(
        rendered = report.rendered,
        hidden = report.hidden,
        invalid = report.invalid,
        scale = mapper.scale(),
        "overlay sync"
    );
    report
}
