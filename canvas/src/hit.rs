#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::RegionId;
use crate::mapper::{Point, Rect};
use crate::overlay::Scene;

/// Which part of an overlay was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [Self; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Display-space position of this handle on `rect`.
    #[must_use]
    pub fn position(self, rect: &Rect) -> Point {
        let cx = rect.x + rect.width * 0.5;
        let cy = rect.y + rect.height * 0.5;
        match self {
            Self::N => Point::new(cx, rect.y),
            Self::Ne => Point::new(rect.right(), rect.y),
            Self::E => Point::new(rect.right(), cy),
            Self::Se => Point::new(rect.right(), rect.bottom()),
            Self::S => Point::new(cx, rect.bottom()),
            Self::Sw => Point::new(rect.x, rect.bottom()),
            Self::W => Point::new(rect.x, cy),
            Self::Nw => Point::new(rect.x, rect.y),
        }
    }

    /// Resize `orig` by dragging this handle `(dx, dy)`.
    ///
    /// Edges not owned by the handle stay put. Dragging past the opposite
    /// edge flips the rectangle rather than producing negative size.
    #[must_use]
    pub fn resize(self, orig: &Rect, dx: f64, dy: f64) -> Rect {
        let (mut left, mut top, mut right, mut bottom) = (orig.x, orig.y, orig.right(), orig.bottom());
        match self {
            Self::N => top += dy,
            Self::Ne => {
                top += dy;
                right += dx;
            }
            Self::E => right += dx,
            Self::Se => {
                right += dx;
                bottom += dy;
            }
            Self::S => bottom += dy,
            Self::Sw => {
                left += dx;
                bottom += dy;
            }
            Self::W => left += dx,
            Self::Nw => {
                left += dx;
                top += dy;
            }
        }
        Rect::from_corners(Point::new(left, top), Point::new(right, bottom))
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub region_id: RegionId,
    pub part: HitPart,
}

/// Find the overlay under `pt`.
///
/// Handles of the selected overlay are checked first, within `handle_radius`
/// display pixels. Bodies are then checked topmost first. The background
/// image and the transient drawing rectangle are never hit.
#[must_use]
pub fn hit_test(pt: Point, scene: &Scene, selected: Option<&RegionId>, handle_radius: f64) -> Option<Hit> {
    if let Some(sel) = selected {
        if let Some(overlay) = scene.overlay(sel) {
            for anchor in ResizeAnchor::ALL {
                let handle = anchor.position(&overlay.rect);
                if (pt.x - handle.x).abs() <= handle_radius && (pt.y - handle.y).abs() <= handle_radius {
                    return Some(Hit { region_id: sel.clone(), part: HitPart::ResizeHandle(anchor) });
                }
            }
        }
    }

    scene
        .overlays()
        .iter()
        .rev()
        .find(|o| o.rect.contains(pt))
        .map(|o| Hit { region_id: o.region_id.clone(), part: HitPart::Body })
}
