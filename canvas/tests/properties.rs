//! End-to-end behavioral properties of the canvas engine, through the public API.
#![allow(clippy::float_cmp)]

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use canvas::config::CanvasConfig;
use canvas::doc::{AnnotationRegion, BoundingBox, RegionId, RegionStore, SourceKind};
use canvas::engine::{Action, Engine, EngineCore};
use canvas::input::Button;
use canvas::lifecycle::{Image, ImageLoader, ImageSource, LoadError};
use canvas::mapper::{CoordinateMapper, ImagePoint, Point, Rect};
use canvas::render::HeadlessSurface;
use canvas::viewport::{ContainerBounds, FitCaps, ImageSize, ViewState, fit};
use image::RgbaImage;

// =============================================================
// Helpers
// =============================================================

fn region(id: &str, x1: i64, y1: i64, x2: i64, y2: i64) -> AnnotationRegion {
    AnnotationRegion {
        id: RegionId::from(id),
        bbox: BoundingBox::new(x1, y1, x2, y2),
        text: String::new(),
        confidence: 0.8,
        visible: true,
        source_kind: SourceKind::Detected,
        language: None,
    }
}

/// 3000x2000 image in a 1000x1000 container: fitted to 900x600, scale 0.3.
fn odd_scale_core() -> EngineCore {
    let mut core = EngineCore::default();
    core.set_container(ContainerBounds::new(1000.0, 1000.0));
    let pixels = RgbaImage::new(3000, 2000);
    let image = Image::new(ImageSource::File("scan.png".into()), 1, pixels).unwrap();
    core.commit_image(Arc::new(image));
    core
}

fn drag(core: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    let mut actions = core.on_pointer_down(from, Button::Primary);
    actions.extend(core.on_pointer_move(to));
    actions.extend(core.on_pointer_up(to, Button::Primary));
    actions
}

fn created(actions: &[Action]) -> Vec<AnnotationRegion> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::RegionCreated(r) => Some(r.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================
// 1. Mapper round trip
// =============================================================

#[test]
fn round_trip_within_one_pixel_for_all_zooms() {
    let base_scales = [0.3, 0.5, 1.0, 0.123_456, 1200.0 / 4961.0];
    let mut zoom = 0.1;
    while zoom <= 5.0 {
        for base in base_scales {
            let mapper = CoordinateMapper::new(base, zoom);
            for x in (0..5000).step_by(173) {
                for y in (0..5000).step_by(211) {
                    let p = ImagePoint::new(x, y);
                    let back = mapper.to_image(mapper.to_display(p));
                    assert!(
                        (back.x - p.x).abs() <= 1 && (back.y - p.y).abs() <= 1,
                        "zoom {zoom} base {base}: {p:?} -> {back:?}"
                    );
                }
            }
        }
        zoom += 0.07;
    }
}

// =============================================================
// 2. Fitting stays within caps and keeps aspect
// =============================================================

#[test]
fn fitting_respects_caps_and_aspect() {
    let config = CanvasConfig::default();
    let containers = [
        ContainerBounds::default(),
        ContainerBounds::new(800.0, 600.0),
        ContainerBounds::new(1920.0, 1080.0),
        ContainerBounds::new(320.0, 900.0),
    ];
    let images = [(4000, 3000), (3000, 4000), (100, 100), (5000, 200), (200, 5000), (1199, 801)];
    for container in containers {
        let caps = FitCaps::for_container(container, &config);
        for (w, h) in images {
            let size = ImageSize::new(w, h).unwrap();
            for upscale in [false, true] {
                let d = fit(size, caps, upscale);
                assert!(d.width <= caps.max_width + 1e-9 && d.height <= caps.max_height + 1e-9);
                assert!((d.width / d.height - size.aspect()).abs() < 0.01 * size.aspect());
            }
            let view = ViewState::fitted(size, container, 1.0, &config);
            let m = view.mapper();
            let sx = view.display_width() / f64::from(w);
            let sy = view.display_height() / f64::from(h);
            assert!((sx - m.scale()).abs() < 1e-9 && (sy - m.scale()).abs() < 1e-9, "anisotropic {w}x{h}");
        }
    }
}

// =============================================================
// 3. Drawing threshold and transform
// =============================================================

#[test]
fn drawing_5x5_creates_nothing_and_50x30_creates_one() {
    let mut core = odd_scale_core();
    assert_eq!(core.mapper().scale(), 0.3);

    let tiny = drag(&mut core, Point::new(100.0, 100.0), Point::new(105.0, 105.0));
    assert!(created(&tiny).is_empty());

    let actions = drag(&mut core, Point::new(100.0, 100.0), Point::new(150.0, 130.0));
    let regions = created(&actions);
    assert_eq!(regions.len(), 1);
    let expected = core.mapper().rect_to_image(&Rect::new(100.0, 100.0, 50.0, 30.0));
    assert_eq!(regions[0].bbox, expected);
    assert_eq!(regions[0].bbox, BoundingBox::new(333, 333, 500, 433));
}

// =============================================================
// 4. Latest load wins
// =============================================================

struct DelayedLoader;

impl ImageLoader for DelayedLoader {
    async fn load(&self, source: &ImageSource) -> Result<RgbaImage, LoadError> {
        let (delay, w, h) = match source.to_string().as_str() {
            "fast.png" => (5, 300, 200),
            "slow.png" => (40, 900, 600),
            _ => return Err(LoadError::Empty),
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(RgbaImage::new(w, h))
    }
}

async fn race(first: &str, second: &str) -> Engine<HeadlessSurface, DelayedLoader> {
    let mut engine = Engine::new(CanvasConfig::default(), HeadlessSurface::new(), DelayedLoader);
    let a = engine.begin_load(ImageSource::parse(first)).unwrap();
    let b = engine.begin_load(ImageSource::parse(second)).unwrap();
    let mut a = pin!(a.resolve());
    let mut b = pin!(b.resolve());
    let (early, late) = tokio::select! {
        out = &mut a => (out, b.await),
        out = &mut b => (out, a.await),
    };
    engine.finish_load(early);
    engine.finish_load(late);
    engine
}

#[tokio::test]
async fn second_load_wins_when_it_finishes_first() {
    let engine = race("slow.png", "fast.png").await;
    let image = engine.image().unwrap();
    assert_eq!(image.source().to_string(), "fast.png");
    assert_eq!(engine.surface().size(), (300, 200));
}

#[tokio::test]
async fn second_load_wins_when_it_finishes_last() {
    let engine = race("fast.png", "slow.png").await;
    let image = engine.image().unwrap();
    assert_eq!(image.source().to_string(), "slow.png");
    assert_eq!(image.generation(), 2);
    assert_eq!(engine.surface().size(), (900, 600));
}

// =============================================================
// 5. Single selection
// =============================================================

#[test]
fn selecting_a_then_b_never_shows_two_selected() {
    let mut core = odd_scale_core();
    let mut store = RegionStore::new();
    store.load(vec![region("a", 0, 0, 1000, 1000), region("b", 2000, 1000, 2900, 1900)]);
    core.set_regions(store.regions().to_vec());

    let steps = [
        (Point::new(150.0, 150.0), Some("a")),
        (Point::new(700.0, 450.0), Some("b")),
    ];
    for (at, expect) in steps {
        let down = core.on_pointer_down(at, Button::Primary);
        assert!(core.scene().selected_count() <= 1);
        let moved = core.on_pointer_move(at);
        assert!(core.scene().selected_count() <= 1);
        let up = core.on_pointer_up(at, Button::Primary);
        assert!(core.scene().selected_count() <= 1);

        for batch in [&down, &moved, &up] {
            store.apply_all(batch);
        }
        core.set_selected(store.selected().cloned());
        assert_eq!(core.scene().selected_count(), 1);
        assert_eq!(core.selection().map(RegionId::as_str), expect);
    }

    core.set_selected(None);
    assert_eq!(core.scene().selected_count(), 0);
}

// =============================================================
// 6. Zoom round trip restores overlays
// =============================================================

#[test]
fn zoom_there_and_back_restores_overlays() {
    let mut core = odd_scale_core();
    core.set_regions(vec![region("a", 17, 23, 911, 407), region("b", 1234, 987, 2999, 1999)]);
    let before: Vec<Rect> = core.scene().overlays().iter().map(|o| o.rect).collect();

    for factor in [2.0, 0.37, 4.9, 1.0] {
        core.set_zoom(factor);
    }
    let after: Vec<Rect> = core.scene().overlays().iter().map(|o| o.rect).collect();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert!((b.x - a.x).abs() <= 1.0 && (b.y - a.y).abs() <= 1.0);
        assert!((b.width - a.width).abs() <= 1.0 && (b.height - a.height).abs() <= 1.0);
    }
}
