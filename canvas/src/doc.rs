//! Document model: annotation regions, their geometry, and a reference owner.
//!
//! Regions are owned by the caller, not by the engine. The engine receives
//! the authoritative list, mirrors it as overlays, and reports change requests
//! back as [`crate::engine::Action`]s. [`RegionStore`] is a ready-made owner
//! that applies those actions; hosts with their own state can ignore it.
//!
//! Data flows into this layer from the detection backend (JSON
//! deserialization of [`DetectionResponse`]) and from manual drawing.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Action;
use crate::mapper::ImagePoint;

/// Stable, externally assigned region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for a manually drawn region.
    #[must_use]
    pub fn manual() -> Self {
        Self(format!("manual-{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Image-space bounding box. Valid boxes have `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The box spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_points(a: ImagePoint, b: ImagePoint) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    #[must_use]
    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    /// Intersect with the raster `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = i64::from(width);
        let h = i64::from(height);
        Self {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }
}

/// Where a region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Produced by the detection backend.
    #[default]
    Detected,
    /// Drawn by the user on the canvas.
    Manual,
}

/// A rectangular annotation over the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRegion {
    /// Unique identifier, assigned by whoever created the region.
    pub id: RegionId,
    /// Image-space geometry; serialized flat as `x1, y1, x2, y2`.
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Recognized or manually entered text.
    #[serde(default)]
    pub text: String,
    /// Recognition confidence in `0.0..=1.0`.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    /// Hidden regions keep their data but get no overlay.
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default, rename = "source")]
    pub source_kind: SourceKind,
    /// Detected language code, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

fn full_confidence() -> f64 {
    1.0
}

fn visible_by_default() -> bool {
    true
}

impl AnnotationRegion {
    /// A freshly drawn region: new id, empty text, full confidence.
    #[must_use]
    pub fn manual(bbox: BoundingBox) -> Self {
        Self {
            id: RegionId::manual(),
            bbox,
            text: String::new(),
            confidence: 1.0,
            visible: true,
            source_kind: SourceKind::Manual,
            language: None,
        }
    }
}

/// One text box as returned by the detection backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBox {
    pub text: String,
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// OCR payload of a detection response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text_boxes: Vec<DetectedBox>,
    #[serde(default)]
    pub detected_language: Option<String>,
}

/// Full-page detection response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub ocr_result: OcrResult,
    #[serde(default)]
    pub total_text_boxes: Option<usize>,
}

impl DetectionResponse {
    /// Parse a detection response body.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error if the body does not match.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Convert detected boxes to regions with ids `box-<index>`.
    ///
    /// A box's own language wins over the page-level detected language.
    #[must_use]
    pub fn into_regions(self) -> Vec<AnnotationRegion> {
        let page_language = self.ocr_result.detected_language;
        self.ocr_result
            .text_boxes
            .into_iter()
            .enumerate()
            .map(|(index, b)| AnnotationRegion {
                id: RegionId(format!("box-{index}")),
                bbox: BoundingBox::new(b.x1, b.y1, b.x2, b.y2),
                text: b.text,
                confidence: b.confidence.clamp(0.0, 1.0),
                visible: true,
                source_kind: SourceKind::Detected,
                language: b.language.or_else(|| page_language.clone()),
            })
            .collect()
    }
}

/// Ordered, authoritative region list plus the selection id.
///
/// This is the caller side of the engine contract: it owns the data and
/// applies the change requests the engine emits.
#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    regions: Vec<AnnotationRegion>,
    selected: Option<RegionId>,
}

impl RegionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all regions. Selection is cleared if its region is gone.
    pub fn load(&mut self, regions: Vec<AnnotationRegion>) {
        self.regions = regions;
        if let Some(id) = &self.selected {
            if self.get(id).is_none() {
                self.selected = None;
            }
        }
    }

    /// Append a region, or replace the existing one with the same id in place.
    pub fn insert(&mut self, region: AnnotationRegion) {
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    /// Remove a region by id, returning it if it was present.
    pub fn remove(&mut self, id: &RegionId) -> Option<AnnotationRegion> {
        let index = self.regions.iter().position(|r| &r.id == id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Some(self.regions.remove(index))
    }

    /// Replace a region's geometry. Returns false if the region doesn't exist.
    pub fn update_bbox(&mut self, id: &RegionId, bbox: BoundingBox) -> bool {
        let Some(region) = self.get_mut(id) else {
            return false;
        };
        region.bbox = bbox;
        true
    }

    /// Replace a region's text. Returns false if the region doesn't exist.
    pub fn set_text(&mut self, id: &RegionId, text: impl Into<String>) -> bool {
        let Some(region) = self.get_mut(id) else {
            return false;
        };
        region.text = text.into();
        true
    }

    /// Flip a region's visibility, returning the new value.
    pub fn toggle_visible(&mut self, id: &RegionId) -> Option<bool> {
        let region = self.get_mut(id)?;
        region.visible = !region.visible;
        Some(region.visible)
    }

    /// Set the selection. Unknown ids are rejected and leave selection unchanged.
    pub fn select(&mut self, id: Option<RegionId>) -> bool {
        if let Some(id) = &id {
            if self.get(id).is_none() {
                return false;
            }
        }
        self.selected = id;
        true
    }

    /// Apply one engine action. Returns true if the store changed.
    pub fn apply(&mut self, action: &Action) -> bool {
        match action {
            Action::RegionCreated(region) => {
                self.insert(region.clone());
                true
            }
            Action::RegionUpdated { id, bbox } => self.update_bbox(id, *bbox),
            Action::RegionSelected(id) => {
                if self.selected == *id {
                    return false;
                }
                self.select(id.clone())
            }
            _ => false,
        }
    }

    /// Apply a batch of engine actions. Returns true if anything changed.
    pub fn apply_all(&mut self, actions: &[Action]) -> bool {
        actions
            .iter()
            .fold(false, |changed, action| self.apply(action) || changed)
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&AnnotationRegion> {
        self.regions.iter().find(|r| &r.id == id)
    }

    fn get_mut(&mut self, id: &RegionId) -> Option<&mut AnnotationRegion> {
        self.regions.iter_mut().find(|r| &r.id == id)
    }

    /// All regions in owner order.
    #[must_use]
    pub fn regions(&self) -> &[AnnotationRegion] {
        &self.regions
    }

    #[must_use]
    pub fn selected(&self) -> Option<&RegionId> {
        self.selected.as_ref()
    }

    /// Number of regions currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the store contains no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
