use std::sync::Arc;

use image::RgbaImage;

use super::*;
use crate::doc::{BoundingBox, SourceKind};
use crate::lifecycle::ImageSource;

fn region(id: &str, bbox: BoundingBox) -> AnnotationRegion {
    AnnotationRegion {
        id: RegionId::from(id),
        bbox,
        text: String::new(),
        confidence: 0.5,
        visible: true,
        source_kind: SourceKind::Detected,
        language: None,
    }
}

fn hidden(id: &str, bbox: BoundingBox) -> AnnotationRegion {
    AnnotationRegion { visible: false, ..region(id, bbox) }
}

fn three_regions() -> Vec<AnnotationRegion> {
    vec![
        region("a", BoundingBox::new(0, 0, 100, 100)),
        region("b", BoundingBox::new(200, 200, 300, 260)),
        region("c", BoundingBox::new(10, 400, 50, 420)),
    ]
}

fn test_image() -> Arc<Image> {
    Arc::new(Image::new(ImageSource::File("page.png".into()), 1, RgbaImage::new(4, 4)).unwrap())
}

// =============================================================
// OverlayStyle
// =============================================================

#[test]
fn selected_style_is_dashed_accent() {
    assert_eq!(OverlayStyle::Selected.dash(), Some(5.0));
    assert_eq!(OverlayStyle::Selected.stroke_rgba(), [239, 68, 68, 255]);
}

#[test]
fn default_style_is_solid() {
    assert_eq!(OverlayStyle::Default.dash(), None);
    assert_eq!(OverlayStyle::Default.stroke_rgba(), [59, 130, 246, 255]);
}

#[test]
fn drawing_style_is_dashed_default_color() {
    assert_eq!(OverlayStyle::Drawing.dash(), Some(5.0));
    assert_eq!(OverlayStyle::Drawing.stroke_rgba(), OverlayStyle::Default.stroke_rgba());
}

// =============================================================
// sync
// =============================================================

#[test]
fn sync_creates_one_overlay_per_visible_region() {
    let mut scene = Scene::new();
    let report = sync(&mut scene, &three_regions(), None, &CoordinateMapper::default());
    assert_eq!(report, SyncReport { rendered: 3, hidden: 0, invalid: 0 });
    let ids: Vec<&str> = scene.overlays().iter().map(|o| o.region_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn sync_maps_geometry_through_mapper() {
    let mut scene = Scene::new();
    sync(&mut scene, &three_regions(), None, &CoordinateMapper::new(0.5, 1.0));
    let b = scene.overlay(&"b".into()).unwrap();
    assert_eq!(b.rect, Rect::new(100.0, 100.0, 50.0, 30.0));
}

#[test]
fn sync_skips_hidden_regions() {
    let mut scene = Scene::new();
    let regions = vec![
        region("a", BoundingBox::new(0, 0, 10, 10)),
        hidden("b", BoundingBox::new(0, 0, 10, 10)),
    ];
    let report = sync(&mut scene, &regions, None, &CoordinateMapper::default());
    assert_eq!(report.hidden, 1);
    assert!(scene.overlay(&"b".into()).is_none());
}

#[test]
fn sync_skips_invalid_geometry() {
    let mut scene = Scene::new();
    let regions = vec![
        region("flat", BoundingBox::new(10, 10, 10, 50)),
        region("inverted", BoundingBox::new(10, 50, 60, 20)),
        region("ok", BoundingBox::new(0, 0, 5, 5)),
    ];
    let report = sync(&mut scene, &regions, None, &CoordinateMapper::default());
    assert_eq!(report, SyncReport { rendered: 1, hidden: 0, invalid: 2 });
    assert_eq!(scene.overlays().len(), 1);
}

#[test]
fn sync_styles_only_selected_region() {
    let mut scene = Scene::new();
    let selected = RegionId::from("b");
    sync(&mut scene, &three_regions(), Some(&selected), &CoordinateMapper::default());
    assert_eq!(scene.selected_count(), 1);
    assert_eq!(scene.overlay(&"b".into()).unwrap().style, OverlayStyle::Selected);
    assert_eq!(scene.overlay(&"a".into()).unwrap().style, OverlayStyle::Default);
}

#[test]
fn sync_with_unknown_selection_styles_nothing() {
    let mut scene = Scene::new();
    let selected = RegionId::from("ghost");
    sync(&mut scene, &three_regions(), Some(&selected), &CoordinateMapper::default());
    assert_eq!(scene.selected_count(), 0);
}

#[test]
fn sync_removes_orphan_overlays() {
    let mut scene = Scene::new();
    sync(&mut scene, &three_regions(), None, &CoordinateMapper::default());
    let remaining = vec![region("c", BoundingBox::new(10, 400, 50, 420))];
    sync(&mut scene, &remaining, None, &CoordinateMapper::default());
    assert_eq!(scene.overlays().len(), 1);
    assert!(scene.overlay(&"a".into()).is_none());
}

#[test]
fn sync_keeps_background_and_transient() {
    let mut scene = Scene::new();
    scene.set_background(test_image());
    scene.set_transient(Some(Rect::new(1.0, 1.0, 2.0, 2.0)));
    sync(&mut scene, &three_regions(), None, &CoordinateMapper::default());
    assert!(scene.background().is_some());
    assert!(scene.transient().is_some());
}

// =============================================================
// Scene
// =============================================================

#[test]
fn scene_clear_drops_everything() {
    let mut scene = Scene::new();
    scene.set_background(test_image());
    scene.set_transient(Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
    sync(&mut scene, &three_regions(), None, &CoordinateMapper::default());
    scene.clear();
    assert!(scene.background().is_none());
    assert!(scene.overlays().is_empty());
    assert!(scene.transient().is_none());
}

#[test]
fn scene_preview_overlay_moves_only_target() {
    let mut scene = Scene::new();
    sync(&mut scene, &three_regions(), None, &CoordinateMapper::default());
    let moved = Rect::new(5.0, 5.0, 100.0, 100.0);
    assert!(scene.preview_overlay(&"a".into(), moved));
    assert_eq!(scene.overlay(&"a".into()).unwrap().rect, moved);
    assert_eq!(scene.overlay(&"b".into()).unwrap().rect, Rect::new(200.0, 200.0, 100.0, 60.0));
    assert!(!scene.preview_overlay(&"ghost".into(), moved));
}
