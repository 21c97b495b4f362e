//! Shared numeric constants for the canvas crate.
//!
//! Policy values here are only defaults; [`crate::config::CanvasConfig`] is
//! what the engine actually reads.

// ── Drawing ─────────────────────────────────────────────────────

/// Drawn rectangles narrower or shorter than this (display pixels) are discarded.
pub const MIN_DRAW_SIZE_PX: f64 = 10.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest zoom factor accepted by the zoom controller.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor accepted by the zoom controller.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplier applied by a single zoom-in / zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;

// ── Viewport fitting ────────────────────────────────────────────

/// Hard cap on the fitted display width, in pixels.
pub const MAX_DISPLAY_WIDTH: f64 = 1200.0;

/// Hard cap on the fitted display height, in pixels.
pub const MAX_DISPLAY_HEIGHT: f64 = 800.0;

/// Share of the container the fitted image may occupy on each axis.
pub const CONTAINER_FILL_RATIO: f64 = 0.9;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── Overlay style ───────────────────────────────────────────────

/// Stroke width of region overlays, in display pixels.
pub const OVERLAY_STROKE_WIDTH_PX: f64 = 2.0;

/// Dash and gap length for dashed strokes, in display pixels.
pub const OVERLAY_DASH_PX: f64 = 5.0;

/// Stroke color for unselected overlays (`#3b82f6`).
pub const STROKE_DEFAULT_RGBA: [u8; 4] = [59, 130, 246, 255];

/// Stroke color for the selected overlay (`#ef4444`).
pub const STROKE_SELECTED_RGBA: [u8; 4] = [239, 68, 68, 255];

/// Translucent fill shared by all overlays (`rgba(59, 130, 246, 0.2)`).
pub const OVERLAY_FILL_RGBA: [u8; 4] = [59, 130, 246, 51];
