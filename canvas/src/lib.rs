//! Annotation canvas engine for the image translator.
//!
//! The engine shows a loaded raster image, mirrors a caller-owned list of
//! rectangular annotation regions as overlays, and turns pointer input into
//! region creation, selection and move/resize requests. It never edits the
//! region list itself: every change is reported to the owner as an
//! [`engine::Action`], and the owner feeds the updated list back in.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::Engine`] and the testable [`engine::EngineCore`] |
//! | [`doc`] | Regions, bounding boxes, detection responses and the reference [`doc::RegionStore`] owner |
//! | [`mapper`] | Image-space / display-space transform and point/rectangle types |
//! | [`viewport`] | Fitting the image into the container, plus zoomed view state |
//! | [`overlay`] | The drawable [`overlay::Scene`] and the full-rebuild overlay sync |
//! | [`input`] | Input event types and the interaction state machine |
//! | [`hit`] | Hit-testing against overlays and resize handles |
//! | [`lifecycle`] | Image sources, loading, generation-guarded commits and teardown |
//! | [`render`] | The [`render::Surface`] trait with headless and raster surfaces |
//! | [`config`] | Policy values with environment overrides |
//! | [`consts`] | Default policy constants and overlay colors |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod lifecycle;
pub mod mapper;
pub mod overlay;
pub mod render;
pub mod viewport;
