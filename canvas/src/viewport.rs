//! Viewport fitting: how large the loaded image is drawn before zoom.
//!
//! The fitted ("base") display size preserves the image's aspect ratio and
//! stays inside the caps derived from the container and the configured
//! maximum display size. Zoom multiplies the base size; it never changes it.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::Serialize;

use crate::config::CanvasConfig;
use crate::mapper::CoordinateMapper;

/// Intrinsic raster dimensions. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Returns `None` for zero-sized images.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Available space around the canvas, in display pixels.
///
/// A non-positive side means "unknown"; fitting then uses the configured caps alone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ContainerBounds {
    pub width: f64,
    pub height: f64,
}

impl ContainerBounds {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Maximum fitted width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitCaps {
    pub max_width: f64,
    pub max_height: f64,
}

impl FitCaps {
    /// The smaller of `fill_ratio * container` and the absolute caps, per axis.
    #[must_use]
    pub fn for_container(container: ContainerBounds, config: &CanvasConfig) -> Self {
        if !container.is_known() {
            return Self { max_width: config.max_display_width, max_height: config.max_display_height };
        }
        Self {
            max_width: (container.width * config.container_fill_ratio).min(config.max_display_width),
            max_height: (container.height * config.container_fill_ratio).min(config.max_display_height),
        }
    }

    fn aspect(&self) -> f64 {
        self.max_width / self.max_height
    }
}

/// A display-space size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

/// Compute the fitted display size of an image.
///
/// If the image is relatively wider than the cap box it is constrained by
/// width, otherwise by height; the other side follows from the aspect ratio.
/// The constrained side is `min(cap, intrinsic)` unless `upscale` is set, in
/// which case small images are stretched to the cap.
#[must_use]
pub fn fit(image: ImageSize, caps: FitCaps, upscale: bool) -> DisplaySize {
    let aspect = image.aspect();
    if aspect > caps.aspect() {
        let width = if upscale { caps.max_width } else { caps.max_width.min(f64::from(image.width)) };
        DisplaySize { width, height: width / aspect }
    } else {
        let height = if upscale { caps.max_height } else { caps.max_height.min(f64::from(image.height)) };
        DisplaySize { width: height * aspect, height }
    }
}

/// Fitted size plus zoom for the currently loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    /// Intrinsic size of the image the view was fitted to.
    pub image: ImageSize,
    /// Fitted size at zoom 1.0.
    pub base: DisplaySize,
    /// Current zoom factor.
    pub zoom: f64,
}

impl ViewState {
    /// Fit `image` into `container` and start at `zoom`.
    #[must_use]
    pub fn fitted(image: ImageSize, container: ContainerBounds, zoom: f64, config: &CanvasConfig) -> Self {
        let caps = FitCaps::for_container(container, config);
        Self { image, base: fit(image, caps, config.upscale_small_images), zoom }
    }

    #[must_use]
    pub fn display_width(&self) -> f64 {
        self.base.width * self.zoom
    }

    #[must_use]
    pub fn display_height(&self) -> f64 {
        self.base.height * self.zoom
    }

    /// Current display size (base size times zoom).
    #[must_use]
    pub fn display_size(&self) -> DisplaySize {
        DisplaySize { width: self.display_width(), height: self.display_height() }
    }

    /// The mapper for this view: `base.width / intrinsic width`, times zoom.
    #[must_use]
    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.base.width / f64::from(self.image.width), self.zoom)
    }
}
