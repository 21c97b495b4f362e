//! Canvas policy configuration.
//!
//! Every tunable the engine consults lives in [`CanvasConfig`]. Defaults come
//! from [`crate::consts`]; overrides can be read from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{
    CONTAINER_FILL_RATIO, HANDLE_RADIUS_PX, MAX_DISPLAY_HEIGHT, MAX_DISPLAY_WIDTH, MAX_ZOOM, MIN_DRAW_SIZE_PX,
    MIN_ZOOM, ZOOM_STEP,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("min_zoom ({min}) exceeds max_zoom ({max})")]
    ZoomBounds { min: f64, max: f64 },
    #[error("zoom_step must be greater than 1, got {0}")]
    ZoomStep(f64),
    #[error("container_fill_ratio must be in (0, 1], got {0}")]
    FillRatio(f64),
}

/// Policy values for drawing, zoom, fitting and hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Minimum width and height of a drawn rectangle, in display pixels.
    pub min_draw_size_px: f64,
    /// Lower zoom bound.
    pub min_zoom: f64,
    /// Upper zoom bound.
    pub max_zoom: f64,
    /// Factor applied by one zoom-in / zoom-out step.
    pub zoom_step: f64,
    /// Absolute cap on fitted display width.
    pub max_display_width: f64,
    /// Absolute cap on fitted display height.
    pub max_display_height: f64,
    /// Share of the container the fitted image may use on each axis.
    pub container_fill_ratio: f64,
    /// Hit slop around resize handles, in display pixels.
    pub handle_radius_px: f64,
    /// Stretch images smaller than the caps to fill the fitted box.
    pub upscale_small_images: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_draw_size_px: MIN_DRAW_SIZE_PX,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            max_display_width: MAX_DISPLAY_WIDTH,
            max_display_height: MAX_DISPLAY_HEIGHT,
            container_fill_ratio: CONTAINER_FILL_RATIO,
            handle_radius_px: HANDLE_RADIUS_PX,
            upscale_small_images: false,
        }
    }
}

impl CanvasConfig {
    /// Build config from process environment variables.
    ///
    /// Optional (defaults in [`crate::consts`]):
    /// - `CANVAS_MIN_DRAW_SIZE_PX`
    /// - `CANVAS_MIN_ZOOM` / `CANVAS_MAX_ZOOM`
    /// - `CANVAS_ZOOM_STEP`
    /// - `CANVAS_MAX_DISPLAY_WIDTH` / `CANVAS_MAX_DISPLAY_HEIGHT`
    /// - `CANVAS_CONTAINER_FILL_RATIO`
    /// - `CANVAS_HANDLE_RADIUS_PX`
    /// - `CANVAS_UPSCALE_SMALL_IMAGES`: `true` / `false`
    ///
    /// Unparseable values fall back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting values fail [`CanvasConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting values fail [`CanvasConfig::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            min_draw_size_px: parse_or(&lookup, "CANVAS_MIN_DRAW_SIZE_PX", defaults.min_draw_size_px),
            min_zoom: parse_or(&lookup, "CANVAS_MIN_ZOOM", defaults.min_zoom),
            max_zoom: parse_or(&lookup, "CANVAS_MAX_ZOOM", defaults.max_zoom),
            zoom_step: parse_or(&lookup, "CANVAS_ZOOM_STEP", defaults.zoom_step),
            max_display_width: parse_or(&lookup, "CANVAS_MAX_DISPLAY_WIDTH", defaults.max_display_width),
            max_display_height: parse_or(&lookup, "CANVAS_MAX_DISPLAY_HEIGHT", defaults.max_display_height),
            container_fill_ratio: parse_or(&lookup, "CANVAS_CONTAINER_FILL_RATIO", defaults.container_fill_ratio),
            handle_radius_px: parse_or(&lookup, "CANVAS_HANDLE_RADIUS_PX", defaults.handle_radius_px),
            upscale_small_images: parse_or(&lookup, "CANVAS_UPSCALE_SMALL_IMAGES", defaults.upscale_small_images),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the policy values are usable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("min_draw_size_px", self.min_draw_size_px),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("max_display_width", self.max_display_width),
            ("max_display_height", self.max_display_height),
            ("handle_radius_px", self.handle_radius_px),
        ];
        for (field, value) in positives {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomBounds { min: self.min_zoom, max: self.max_zoom });
        }
        if self.zoom_step.is_nan() || self.zoom_step <= 1.0 {
            return Err(ConfigError::ZoomStep(self.zoom_step));
        }
        if !(0.0..=1.0).contains(&self.container_fill_ratio) || self.container_fill_ratio == 0.0 {
            return Err(ConfigError::FillRatio(self.container_fill_ratio));
        }
        Ok(())
    }

    /// Clamp a requested zoom factor into `[min_zoom, max_zoom]`.
    ///
    /// NaN is treated as a request for 1.0. Never panics, even on a config
    /// that fails [`CanvasConfig::validate`]: `max_zoom` wins over `min_zoom`
    /// and NaN bounds are ignored.
    #[must_use]
    pub fn clamp_zoom(&self, factor: f64) -> f64 {
        let factor = if factor.is_nan() { 1.0 } else { factor };
        factor.max(self.min_zoom).min(self.max_zoom)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
