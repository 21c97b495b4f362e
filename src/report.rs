//! JSON summary of a canvas session, printed on stdout.

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;

use canvas::doc::{AnnotationRegion, RegionId};
use canvas::engine::{Action, EngineCore};
use canvas::lifecycle::Image;
use canvas::overlay::{Overlay, SyncReport};
use canvas::viewport::ViewState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub source: String,
    pub generation: u64,
    pub width: u32,
    pub height: u32,
}

impl From<&Image> for ImageInfo {
    fn from(image: &Image) -> Self {
        let size = image.size();
        Self {
            source: image.source().to_string(),
            generation: image.generation(),
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncCounts {
    pub rendered: usize,
    pub hidden: usize,
    pub invalid: usize,
}

impl From<SyncReport> for SyncCounts {
    fn from(r: SyncReport) -> Self {
        Self { rendered: r.rendered, hidden: r.hidden, invalid: r.invalid }
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub image: Option<ImageInfo>,
    pub view: Option<ViewState>,
    pub scale: f64,
    pub selected: Option<RegionId>,
    pub regions: Vec<AnnotationRegion>,
    pub overlays: Vec<Overlay>,
    pub sync: SyncCounts,
    pub events: Vec<Action>,
}

impl Report {
    /// Snapshot the engine state along with the events the session emitted.
    #[must_use]
    pub fn capture(core: &EngineCore, image: Option<&Image>, events: Vec<Action>) -> Self {
        Self {
            image: image.map(ImageInfo::from),
            view: core.view().copied(),
            scale: core.mapper().scale(),
            selected: core.selection().cloned(),
            regions: core.regions().to_vec(),
            overlays: core.scene().overlays().to_vec(),
            sync: core.last_sync().into(),
            events,
        }
    }
}
