//! Rendering: draws the scene onto a drawing surface.
//!
//! The engine only talks to the [`Surface`] trait. [`HeadlessSurface`]
//! records what it was asked to draw, which is what tests and the JSON report
//! use. [`RasterSurface`] composites the scene into an RGBA frame: background
//! scaled to the surface, then each overlay as a translucent fill plus a solid
//! or dashed stroke, then the drawing rubber band on top.
//!
//! Surfaces receive read-only views of the scene and never mutate engine state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut, draw_line_segment_mut};

use crate::consts::OVERLAY_STROKE_WIDTH_PX;
use crate::mapper::Rect;
use crate::overlay::{Overlay, OverlayStyle, Scene};

/// A drawing target owned exclusively by one engine.
pub trait Surface {
    /// Set the pixel size of the surface. Called before the first draw and on every display-size change.
    fn resize(&mut self, width: u32, height: u32);

    /// Redraw the whole scene.
    fn draw(&mut self, scene: &Scene);

    /// Free the backing resources. Later draws are ignored.
    fn release(&mut self);
}

// =============================================================
// Headless
// =============================================================

/// Records draws without producing pixels.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    size: (u32, u32),
    frames: usize,
    resizes: usize,
    last_overlays: Vec<Overlay>,
    last_transient: Option<Rect>,
    has_background: bool,
    released: bool,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Number of completed draws.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[must_use]
    pub fn resizes(&self) -> usize {
        self.resizes
    }

    /// Overlays of the most recent draw.
    #[must_use]
    pub fn last_overlays(&self) -> &[Overlay] {
        &self.last_overlays
    }

    #[must_use]
    pub fn last_transient(&self) -> Option<Rect> {
        self.last_transient
    }

    #[must_use]
    pub fn has_background(&self) -> bool {
        self.has_background
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Surface for HeadlessSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.resizes += 1;
    }

    fn draw(&mut self, scene: &Scene) {
        if self.released {
            return;
        }
        self.frames += 1;
        self.last_overlays = scene.overlays().to_vec();
        self.last_transient = scene.transient();
        self.has_background = scene.background().is_some();
    }

    fn release(&mut self) {
        self.released = true;
        self.last_overlays.clear();
        self.last_transient = None;
        self.has_background = false;
    }
}

// =============================================================
// Raster
// =============================================================

/// Composites the scene into an in-memory RGBA frame.
#[derive(Debug, Clone, Default)]
pub struct RasterSurface {
    frame: RgbaImage,
    released: bool,
}

impl RasterSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently drawn frame.
    #[must_use]
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Write the current frame; the format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns the encoder or I/O error from the `image` crate.
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.frame.save(path)
    }
}

impl Surface for RasterSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.frame = RgbaImage::new(width, height);
    }

    fn draw(&mut self, scene: &Scene) {
        if self.released {
            return;
        }
        let (width, height) = self.frame.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        // Layer 1: background, stretched to the surface.
        self.frame = match scene.background() {
            Some(bg) if bg.image.pixels().dimensions() == (width, height) => bg.image.pixels().clone(),
            Some(bg) => imageops::resize(bg.image.pixels(), width, height, FilterType::Triangle),
            None => RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        };

        // Layer 2: region overlays, bottom first.
        let mut canvas = Blend(std::mem::take(&mut self.frame));
        for overlay in scene.overlays() {
            fill_rect(&mut canvas, &overlay.rect, overlay.style.fill_rgba());
            stroke_rect(&mut canvas, &overlay.rect, overlay.style);
        }

        // Layer 3: rubber band.
        if let Some(rect) = scene.transient() {
            fill_rect(&mut canvas, &rect, OverlayStyle::Drawing.fill_rgba());
            stroke_rect(&mut canvas, &rect, OverlayStyle::Drawing);
        }
        self.frame = canvas.0;
    }

    fn release(&mut self) {
        self.released = true;
        self.frame = RgbaImage::new(0, 0);
    }
}

// =============================================================
// Primitives
// =============================================================

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_rect(canvas: &mut Blend<RgbaImage>, rect: &Rect, rgba: [u8; 4]) {
    let w = rect.width.round() as u32;
    let h = rect.height.round() as u32;
    if w == 0 || h == 0 {
        return;
    }
    let area = imageproc::rect::Rect::at(rect.x.round() as i32, rect.y.round() as i32).of_size(w, h);
    draw_filled_rect_mut(canvas, area, Rgba(rgba));
}

#[allow(clippy::cast_possible_truncation)]
fn stroke_rect(canvas: &mut Blend<RgbaImage>, rect: &Rect, style: OverlayStyle) {
    let color = Rgba(style.stroke_rgba());
    let corners = [
        (rect.x, rect.y),
        (rect.right(), rect.y),
        (rect.right(), rect.bottom()),
        (rect.x, rect.bottom()),
    ];
    for i in 0..corners.len() {
        let (x0, y0) = corners[i];
        let (x1, y1) = corners[(i + 1) % corners.len()];
        for offset in 0..OVERLAY_STROKE_WIDTH_PX as i32 {
            let o = f64::from(offset);
            // Widen inward so the stroke stays inside the region bounds.
            let (ox, oy) = inward_offset(i, o);
            let start = ((x0 + ox) as f32, (y0 + oy) as f32);
            let end = ((x1 + ox) as f32, (y1 + oy) as f32);
            match style.dash() {
                Some(dash) => dashed_segment(canvas, start, end, dash as f32, color),
                None => draw_line_segment_mut(canvas, start, end, color),
            }
        }
    }
}

/// Offset for the `edge`-th side (top, right, bottom, left) pushed `o` pixels inward.
fn inward_offset(edge: usize, o: f64) -> (f64, f64) {
    match edge {
        0 => (0.0, o),
        1 => (-o, 0.0),
        2 => (0.0, -o),
        _ => (o, 0.0),
    }
}

/// Alternating on/off segments of length `dash`.
fn dashed_segment(canvas: &mut Blend<RgbaImage>, start: (f32, f32), end: (f32, f32), dash: f32, color: Rgba<u8>) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let len = dx.hypot(dy);
    if len <= f32::EPSILON || dash <= 0.0 {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    let mut t = 0.0;
    while t < len {
        let t_end = (t + dash).min(len);
        draw_line_segment_mut(
            canvas,
            (start.0 + ux * t, start.1 + uy * t),
            (start.0 + ux * t_end, start.1 + uy * t_end),
            color,
        );
        t += dash * 2.0;
    }
}
