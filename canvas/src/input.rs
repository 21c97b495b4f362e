//! Input model: mouse buttons, keys, and the interaction state machine.
//!
//! `InteractionState` holds exactly one mode at a time. Each active variant
//! carries the gesture context needed to preview the gesture while the
//! pointer moves and to emit the final action on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::RegionId;
use crate::hit::ResizeAnchor;
use crate::mapper::{Point, Rect};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key, named as the host reports it (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// What an edit gesture does to the selected overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Move,
    Resize(ResizeAnchor),
}

/// An in-progress move or resize of the selected overlay, in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditGesture {
    pub kind: EditKind,
    /// Pointer position at pointer-down.
    pub start: Point,
    /// Overlay geometry at pointer-down.
    pub orig: Rect,
    /// Previewed geometry after the latest pointer-move.
    pub current: Rect,
}

impl EditGesture {
    #[must_use]
    pub fn new(kind: EditKind, start: Point, orig: Rect) -> Self {
        Self { kind, start, orig, current: orig }
    }

    /// Recompute `current` for the pointer at `pt`.
    pub fn update(&mut self, pt: Point) -> Rect {
        let dx = pt.x - self.start.x;
        let dy = pt.y - self.start.y;
        self.current = match self.kind {
            EditKind::Move => self.orig.translate(dx, dy),
            EditKind::Resize(anchor) => anchor.resize(&self.orig, dx, dy),
        };
        self.current
    }
}

/// The single active interaction mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// Nothing selected, no gesture in progress.
    #[default]
    Idle,
    /// Rubber-band drawing of a new region.
    Drawing {
        /// Display-space pointer-down position.
        origin: Point,
        /// Current rubber band: `min(origin, pointer)` sized `|pointer - origin|`.
        rect: Rect,
    },
    /// A region is selected, optionally with a move/resize gesture in flight.
    Selected { id: RegionId, edit: Option<EditGesture> },
}

impl InteractionState {
    /// Start drawing at `origin` with a zero-size rubber band.
    #[must_use]
    pub fn drawing(origin: Point) -> Self {
        Self::Drawing { origin, rect: Rect::at(origin) }
    }

    /// Resting state for the given selection.
    #[must_use]
    pub fn resting(selected: Option<&RegionId>) -> Self {
        match selected {
            Some(id) => Self::Selected { id: id.clone(), edit: None },
            None => Self::Idle,
        }
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Selected { edit: Some(_), .. })
    }

    /// Whether a pointer gesture is in flight.
    #[must_use]
    pub fn in_gesture(&self) -> bool {
        self.is_drawing() || self.is_editing()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&RegionId> {
        match self {
            Self::Selected { id, .. } => Some(id),
            _ => None,
        }
    }
}
