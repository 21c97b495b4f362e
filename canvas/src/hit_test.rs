use super::*;
use crate::doc::{AnnotationRegion, BoundingBox, SourceKind};
use crate::mapper::CoordinateMapper;
use crate::overlay::sync;

const RADIUS: f64 = 8.0;

fn region(id: &str, x1: i64, y1: i64, x2: i64, y2: i64) -> AnnotationRegion {
    AnnotationRegion {
        id: RegionId::from(id),
        bbox: BoundingBox::new(x1, y1, x2, y2),
        text: String::new(),
        confidence: 1.0,
        visible: true,
        source_kind: SourceKind::Detected,
        language: None,
    }
}

fn scene_with(regions: &[AnnotationRegion], selected: Option<&RegionId>) -> Scene {
    let mut scene = Scene::new();
    sync(&mut scene, regions, selected, &CoordinateMapper::default());
    scene
}

// =============================================================
// ResizeAnchor
// =============================================================

#[test]
fn anchor_positions_on_rect() {
    let r = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert_eq!(ResizeAnchor::Nw.position(&r), Point::new(10.0, 20.0));
    assert_eq!(ResizeAnchor::N.position(&r), Point::new(60.0, 20.0));
    assert_eq!(ResizeAnchor::E.position(&r), Point::new(110.0, 45.0));
    assert_eq!(ResizeAnchor::Se.position(&r), Point::new(110.0, 70.0));
}

#[test]
fn resize_se_grows_bottom_right() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert_eq!(ResizeAnchor::Se.resize(&r, 5.0, 7.0), Rect::new(10.0, 10.0, 25.0, 27.0));
}

#[test]
fn resize_n_moves_only_top() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert_eq!(ResizeAnchor::N.resize(&r, 99.0, 4.0), Rect::new(10.0, 14.0, 20.0, 16.0));
}

#[test]
fn resize_w_past_opposite_edge_flips() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert_eq!(ResizeAnchor::W.resize(&r, 30.0, 0.0), Rect::new(30.0, 10.0, 10.0, 20.0));
}

#[test]
fn resize_nw_moves_top_left() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert_eq!(ResizeAnchor::Nw.resize(&r, -5.0, -5.0), Rect::new(5.0, 5.0, 25.0, 25.0));
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn hit_empty_scene_is_none() {
    let scene = Scene::new();
    assert!(hit_test(Point::new(5.0, 5.0), &scene, None, RADIUS).is_none());
}

#[test]
fn hit_body() {
    let scene = scene_with(&[region("a", 0, 0, 100, 100)], None);
    let hit = hit_test(Point::new(50.0, 50.0), &scene, None, RADIUS).unwrap();
    assert_eq!(hit.region_id, RegionId::from("a"));
    assert_eq!(hit.part, HitPart::Body);
}

#[test]
fn hit_miss_outside_bodies() {
    let scene = scene_with(&[region("a", 0, 0, 100, 100)], None);
    assert!(hit_test(Point::new(150.0, 50.0), &scene, None, RADIUS).is_none());
}

#[test]
fn hit_overlapping_prefers_topmost() {
    let scene = scene_with(&[region("under", 0, 0, 100, 100), region("over", 50, 50, 150, 150)], None);
    let hit = hit_test(Point::new(75.0, 75.0), &scene, None, RADIUS).unwrap();
    assert_eq!(hit.region_id, RegionId::from("over"));
}

#[test]
fn hit_handle_only_on_selected() {
    let a = RegionId::from("a");
    let scene = scene_with(&[region("a", 0, 0, 100, 100)], Some(&a));
    let hit = hit_test(Point::new(103.0, 98.0), &scene, Some(&a), RADIUS).unwrap();
    assert_eq!(hit.part, HitPart::ResizeHandle(ResizeAnchor::Se));

    let unselected = scene_with(&[region("a", 0, 0, 100, 100)], None);
    assert!(hit_test(Point::new(103.0, 98.0), &unselected, None, RADIUS).is_none());
}

#[test]
fn hit_handle_wins_over_other_body() {
    let a = RegionId::from("a");
    let regions = [region("a", 0, 0, 100, 100), region("b", 95, 95, 200, 200)];
    let scene = scene_with(&regions, Some(&a));
    let hit = hit_test(Point::new(100.0, 100.0), &scene, Some(&a), RADIUS).unwrap();
    assert_eq!(hit.region_id, a);
    assert_eq!(hit.part, HitPart::ResizeHandle(ResizeAnchor::Se));
}

#[test]
fn hit_ignores_transient_rect() {
    let mut scene = Scene::new();
    scene.set_transient(Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
    assert!(hit_test(Point::new(10.0, 10.0), &scene, None, RADIUS).is_none());
}
