//! Coordinate mapping between image space and display space.
//!
//! Image space is the intrinsic pixel grid of the loaded raster; region
//! coordinates are stored there as integers. Display space is the pixel grid
//! of the drawing surface after fit-to-container scaling and zoom. The two are
//! related by a single uniform scale, never an anisotropic one.

#[cfg(test)]
#[path = "mapper_test.rs"]
mod mapper_test;

use serde::Serialize;

use crate::doc::BoundingBox;

/// A point in display space (surface pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in image space (integer raster pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImagePoint {
    pub x: i64,
    pub y: i64,
}

impl ImagePoint {
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in display space. Width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width: width.max(0.0), height: height.max(0.0) }
    }

    /// The rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// A zero-sized rectangle anchored at `p`.
    #[must_use]
    pub fn at(p: Point) -> Self {
        Self { x: p.x, y: p.y, width: 0.0, height: 0.0 }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether `p` lies inside or on the border.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// The same rectangle shifted by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

/// Uniform transform between image space and display space.
///
/// The effective scale is `base_scale * zoom`, where `base_scale` is the
/// fitted display width divided by the intrinsic image width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateMapper {
    base_scale: f64,
    zoom: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self { base_scale: 1.0, zoom: 1.0 }
    }
}

impl CoordinateMapper {
    /// Create a mapper. Non-positive or non-finite inputs fall back to 1.0.
    #[must_use]
    pub fn new(base_scale: f64, zoom: f64) -> Self {
        Self { base_scale: sanitize(base_scale), zoom: sanitize(zoom) }
    }

    /// Fit-to-container scale, before zoom.
    #[must_use]
    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Display pixels per image pixel.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.base_scale * self.zoom
    }

    /// Map an image-space point to display space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_display(&self, p: ImagePoint) -> Point {
        let s = self.scale();
        Point::new(p.x as f64 * s, p.y as f64 * s)
    }

    /// Map a display-space point to image space, rounding to the nearest pixel.
    #[must_use]
    pub fn to_image(&self, p: Point) -> ImagePoint {
        let s = self.scale();
        ImagePoint::new(round_to_i64(p.x / s), round_to_i64(p.y / s))
    }

    /// Display-space rectangle covering an image-space bounding box.
    #[must_use]
    pub fn bbox_to_display(&self, bbox: &BoundingBox) -> Rect {
        let a = self.to_display(ImagePoint::new(bbox.x1, bbox.y1));
        let b = self.to_display(ImagePoint::new(bbox.x2, bbox.y2));
        Rect::from_corners(a, b)
    }

    /// Image-space bounding box of a display-space rectangle.
    ///
    /// The result may be degenerate (zero width or height) for tiny rectangles;
    /// callers check [`BoundingBox::is_valid`].
    #[must_use]
    pub fn rect_to_image(&self, rect: &Rect) -> BoundingBox {
        let a = self.to_image(rect.top_left());
        let b = self.to_image(rect.bottom_right());
        BoundingBox::from_points(a, b)
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 1.0 }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(v: f64) -> i64 {
    v.round() as i64
}
