//! Input model: transform handles, modifier keys, and the gesture state machine.
//!
//! `Modifiers` and `ResizeAnchor` capture the user's intent at the time of a
//! pointer event. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up, carrying everything needed to apply the
//! transform incrementally and settle bindings on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::element::{Element, ElementId};
use crate::geom::{Bounds, Point};

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift: keep aspect ratio while resizing, snap angle while rotating.
    pub shift: bool,
    /// Ctrl: suspends binding.
    pub ctrl: bool,
    /// Alt / Option: resize from the center.
    pub alt: bool,
    /// Meta / Command: suspends binding.
    pub meta: bool,
}

impl Modifiers {
    /// Whether arrow ends may bind on release.
    #[must_use]
    pub fn binding_enabled(self) -> bool {
        !(self.ctrl || self.meta)
    }
}

/// Anchor position of a resize handle on the selection box.
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
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Position of the handle as a fraction of the box, `(0, 0)` top-left.
    #[must_use]
    pub fn handle_fraction(self) -> (f64, f64) {
        match self {
            Self::N => (0.5, 0.0),
            Self::Ne => (1.0, 0.0),
            Self::E => (1.0, 0.5),
            Self::Se => (1.0, 1.0),
            Self::S => (0.5, 1.0),
            Self::Sw => (0.0, 1.0),
            Self::W => (0.0, 0.5),
            Self::Nw => (0.0, 0.0),
        }
    }

    /// The point that stays put while this handle is dragged, as a fraction
    /// of the box. With `from_center` it is always the middle.
    #[must_use]
    pub fn pivot_fraction(self, from_center: bool) -> (f64, f64) {
        if from_center {
            return (0.5, 0.5);
        }
        let (hx, hy) = self.handle_fraction();
        (1.0 - hx, 1.0 - hy)
    }

    /// Dragging this handle changes the width.
    #[must_use]
    pub fn moves_x(self) -> bool {
        !matches!(self, Self::N | Self::S)
    }

    /// Dragging this handle changes the height.
    #[must_use]
    pub fn moves_y(self) -> bool {
        !matches!(self, Self::E | Self::W)
    }

    #[must_use]
    pub fn is_corner(self) -> bool {
        self.moves_x() && self.moves_y()
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to apply deltas and
/// settle bindings on pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving the whole selection.
    DraggingSelection {
        /// World-space position of the pointer at the previous event.
        last_world: Point,
    },
    /// The user is dragging individual points of one linear element.
    DraggingPoints {
        /// Id of the line or arrow being edited.
        id: ElementId,
        /// Indices of the points under the pointer.
        indices: Vec<usize>,
        /// World-space position of the pointer at the previous event.
        last_world: Point,
    },
    /// The user is resizing the selection by dragging one of its eight handles.
    Resizing {
        /// Which corner/edge handle is being dragged.
        anchor: ResizeAnchor,
        /// Selection bounds at the start of the resize.
        orig_bounds: Bounds,
        /// Snapshot of the selected elements at the start of the resize.
        originals: Vec<Element>,
    },
    /// The user is rotating the selection by dragging the rotate handle.
    Rotating {
        /// World-space rotation pivot.
        center: Point,
        /// Pointer angle around `center` at the start of the gesture.
        start_angle: f64,
        /// Rotation already applied to a multi-element selection.
        applied: f64,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
