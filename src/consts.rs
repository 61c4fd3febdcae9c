//! Shared numeric constants for the binding engine and the elbow router.

// ── Binding ─────────────────────────────────────────────────────

/// Clearance between a shape outline and an elbow-arrow endpoint snapped to it.
pub const FIXED_BINDING_DISTANCE: f64 = 5.0;

/// Lower clamp of the binding gap / border hit-test threshold.
pub const MIN_BINDING_GAP: f64 = 16.0;

/// Upper clamp of the binding gap / border hit-test threshold.
pub const MAX_BINDING_GAP: f64 = 32.0;

/// Fraction of the smaller shape dimension used as the binding gap.
pub const BINDING_GAP_RATIO: f64 = 0.25;

/// Smallest gap a non-elbow binding ever stores.
pub const MIN_STORED_GAP: f64 = 1.0;

/// Replacement for a fixed-point ratio of exactly one half.
pub const FIXED_POINT_HALF_NUDGE: f64 = 0.5001;

/// Default selection size above which no binding suggestions are computed.
pub const DEFAULT_SUGGESTION_SELECTION_LIMIT: usize = 50;

/// Default fraction of a dimension used as the snap-to-mid threshold.
pub const DEFAULT_SNAP_TO_MID_TOLERANCE: f64 = 0.05;

/// Snap-to-mid threshold clamp, in pixels.
pub const SNAP_TO_MID_MIN_PX: f64 = 5.0;
pub const SNAP_TO_MID_MAX_PX: f64 = 80.0;

/// A point deeper inside a shape than this fraction of its size snaps to a side midpoint.
pub const INNER_SNAP_RATIO: f64 = 0.1;

/// Fixed-point numerical iterations for the ellipse closest-point search.
pub const ELLIPSE_CLOSEST_POINT_ITERATIONS: usize = 4;

// ── Routing ─────────────────────────────────────────────────────

/// Padding grown around bound shapes when generating dynamic boxes.
pub const BASE_PADDING: f64 = 40.0;

/// Half-size of the box used for an unbound elbow endpoint.
pub const POINT_BOX_HALF_SIZE: f64 = 2.0;

/// Scale applied to the corner-to-center cones when classifying a heading.
pub const SEARCH_CONE_MULTIPLIER: f64 = 2.0;

/// Tolerance when deciding whether a fixed point still sits on the outline.
pub const FIXED_POINT_OUTLINE_TOLERANCE: f64 = 0.01;

// ── Transform ───────────────────────────────────────────────────

/// Default rotation snap step in degrees (shift held).
pub const DEFAULT_ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Minimum width/height an element may be resized down to.
pub const MIN_ELEMENT_SIZE: f64 = 1.0;

// ── Math ────────────────────────────────────────────────────────

/// Substitute for a vanishing denominator.
pub const DEGENERATE_EPSILON: f64 = 1e-4;

/// Catmull-Rom tension used to derive bezier handles for rounded lines.
pub const CURVE_TENSION: f64 = 0.5;
