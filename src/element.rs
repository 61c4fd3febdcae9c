//! Element model: shapes, connectors, bindings, and sparse updates.
//!
//! An [`Element`] carries the geometry every kind shares plus an
//! [`ElementKind`] payload. Shapes arrows can attach to are the
//! [`BindableKind`] variants; lines and arrows carry a [`LinearElement`].
//! Mutation goes through [`ElementUpdate`] applied by the scene, which bumps
//! the version counter.

#[cfg(test)]
#[path = "element_test.rs"]
mod element_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::FIXED_POINT_HALF_NUDGE;
use crate::geom::{Bounds, Point, aabb_for_rect};

/// Unique identifier for an element.
pub type ElementId = Uuid;

/// Shape kinds an arrow endpoint can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindableKind {
    Rectangle,
    Diamond,
    Ellipse,
    Text,
    Image,
    Frame,
    Iframe,
    Embeddable,
}

impl BindableKind {
    /// Kinds whose outline is their bounding box.
    #[must_use]
    pub fn is_rectangular(self) -> bool {
        match self {
            Self::Rectangle | Self::Text | Self::Image | Self::Frame | Self::Iframe | Self::Embeddable => true,
            Self::Diamond | Self::Ellipse => false,
        }
    }
}

/// Arrowhead style at one end of a linear element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrowhead {
    Arrow,
    Triangle,
    Bar,
    Dot,
}

/// Which end of a linear element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEnd {
    Start,
    End,
}

impl EdgeEnd {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

/// Location of an elbow-arrow endpoint as a ratio of the bound shape's box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPoint {
    pub x: f64,
    pub y: f64,
}

impl FixedPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nudge either ratio off exactly one half so headings cannot flip on jitter.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn normalize(self) -> Self {
        let nudge = |v: f64| if v == 0.5 { FIXED_POINT_HALF_NUDGE } else { v };
        Self { x: nudge(self.x), y: nudge(self.y) }
    }
}

/// Option-preserving form of [`FixedPoint::normalize`].
#[must_use]
pub fn normalize_fixed_point(fixed_point: Option<FixedPoint>) -> Option<FixedPoint> {
    fixed_point.map(FixedPoint::normalize)
}

/// Attachment of one arrow end to a bindable shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBinding {
    pub element_id: ElementId,
    /// Signed ratio in (-1, 1) locating the tangent point on the focus image.
    pub focus: f64,
    /// Clearance kept between the outline and the endpoint, at least 1.
    pub gap: f64,
    /// Only set for elbow arrows.
    #[serde(default)]
    pub fixed_point: Option<FixedPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    Arrow,
    Text,
}

/// Back-reference from a shape to an element attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: BoundKind,
}

impl BoundElement {
    #[must_use]
    pub fn arrow(id: ElementId) -> Self {
        Self { id, kind: BoundKind::Arrow }
    }
}

/// Payload of a line or arrow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearElement {
    /// Local-space points; the first is always the origin.
    pub points: Vec<Point>,
    #[serde(default)]
    pub start_binding: Option<PointBinding>,
    #[serde(default)]
    pub end_binding: Option<PointBinding>,
    #[serde(default)]
    pub elbowed: bool,
    #[serde(default)]
    pub start_arrowhead: Option<Arrowhead>,
    #[serde(default)]
    pub end_arrowhead: Option<Arrowhead>,
    /// Draw segments as a smooth curve through the points.
    #[serde(default)]
    pub rounded: bool,
}

impl LinearElement {
    #[must_use]
    pub fn binding(&self, end: EdgeEnd) -> Option<&PointBinding> {
        match end {
            EdgeEnd::Start => self.start_binding.as_ref(),
            EdgeEnd::End => self.end_binding.as_ref(),
        }
    }

    #[must_use]
    pub fn arrowhead(&self, end: EdgeEnd) -> Option<Arrowhead> {
        match end {
            EdgeEnd::Start => self.start_arrowhead,
            EdgeEnd::End => self.end_arrowhead,
        }
    }

    /// Fewer than three points.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.points.len() < 3
    }

    /// Index of the point at `end`, or `None` when there are no points.
    #[must_use]
    pub fn end_index(&self, end: EdgeEnd) -> Option<usize> {
        match (end, self.points.len()) {
            (_, 0) => None,
            (EdgeEnd::Start, _) => Some(0),
            (EdgeEnd::End, n) => Some(n - 1),
        }
    }

    /// Index of the point next to the one at `end`.
    #[must_use]
    pub fn adjacent_index(&self, end: EdgeEnd) -> Option<usize> {
        match (end, self.points.len()) {
            (_, 0 | 1) => None,
            (EdgeEnd::Start, _) => Some(1),
            (EdgeEnd::End, n) => Some(n - 2),
        }
    }

    /// Ends whose binding references `shape_id`.
    #[must_use]
    pub fn ends_bound_to(&self, shape_id: ElementId) -> Vec<EdgeEnd> {
        [EdgeEnd::Start, EdgeEnd::End]
            .into_iter()
            .filter(|end| self.binding(*end).is_some_and(|b| b.element_id == shape_id))
            .collect()
    }
}

/// Kind-specific payload, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Diamond,
    Ellipse,
    Text,
    Image,
    Frame,
    Iframe,
    Embeddable,
    Line(LinearElement),
    Arrow(LinearElement),
}

impl ElementKind {
    #[must_use]
    pub fn bindable(&self) -> Option<BindableKind> {
        match self {
            Self::Rectangle => Some(BindableKind::Rectangle),
            Self::Diamond => Some(BindableKind::Diamond),
            Self::Ellipse => Some(BindableKind::Ellipse),
            Self::Text => Some(BindableKind::Text),
            Self::Image => Some(BindableKind::Image),
            Self::Frame => Some(BindableKind::Frame),
            Self::Iframe => Some(BindableKind::Iframe),
            Self::Embeddable => Some(BindableKind::Embeddable),
            Self::Line(_) | Self::Arrow(_) => None,
        }
    }
}

impl From<BindableKind> for ElementKind {
    fn from(kind: BindableKind) -> Self {
        match kind {
            BindableKind::Rectangle => Self::Rectangle,
            BindableKind::Diamond => Self::Diamond,
            BindableKind::Ellipse => Self::Ellipse,
            BindableKind::Text => Self::Text,
            BindableKind::Image => Self::Image,
            BindableKind::Frame => Self::Frame,
            BindableKind::Iframe => Self::Iframe,
            BindableKind::Embeddable => Self::Embeddable,
        }
    }
}

/// An element as stored in the scene and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    /// Left edge of the unrotated box in world coordinates.
    pub x: f64,
    /// Top edge of the unrotated box in world coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in radians around the box center.
    #[serde(default)]
    pub angle: f64,
    /// Stacking order; lower values are beneath higher values.
    #[serde(default)]
    pub z_index: i64,
    /// Bumped on every mutation.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub is_deleted: bool,
    /// Elements attached to this one.
    #[serde(default)]
    pub bound_elements: Vec<BoundElement>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// A new bindable shape with a fresh id.
    #[must_use]
    pub fn shape(kind: BindableKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            width,
            height,
            angle: 0.0,
            z_index: 0,
            version: 1,
            is_deleted: false,
            bound_elements: Vec::new(),
            kind: kind.into(),
        }
    }

    /// A new sharp, unbound arrow at `(x, y)` through local `points`.
    #[must_use]
    pub fn arrow(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::linear(x, y, ElementKind::Arrow(LinearElement { points, ..LinearElement::default() }))
    }

    /// A new elbow arrow at `(x, y)` through local `points`.
    #[must_use]
    pub fn elbow_arrow(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::linear(
            x,
            y,
            ElementKind::Arrow(LinearElement {
                points,
                elbowed: true,
                end_arrowhead: Some(Arrowhead::Arrow),
                ..LinearElement::default()
            }),
        )
    }

    /// A new plain line at `(x, y)` through local `points`.
    #[must_use]
    pub fn line(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::linear(x, y, ElementKind::Line(LinearElement { points, ..LinearElement::default() }))
    }

    fn linear(x: f64, y: f64, kind: ElementKind) -> Self {
        let mut element = Self {
            id: Uuid::new_v4(),
            x,
            y,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
            z_index: 0,
            version: 1,
            is_deleted: false,
            bound_elements: Vec::new(),
            kind,
        };
        element.sync_linear_size();
        element
    }

    #[must_use]
    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn bindable_kind(&self) -> Option<BindableKind> {
        self.kind.bindable()
    }

    /// Snapshot of the geometry needed by the outline math.
    #[must_use]
    pub fn as_bindable(&self) -> Option<BindableShape> {
        self.kind.bindable().map(|kind| BindableShape {
            id: self.id,
            kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            angle: self.angle,
        })
    }

    #[must_use]
    pub fn as_linear(&self) -> Option<&LinearElement> {
        match &self.kind {
            ElementKind::Line(linear) | ElementKind::Arrow(linear) => Some(linear),
            _ => None,
        }
    }

    pub fn as_linear_mut(&mut self) -> Option<&mut LinearElement> {
        match &mut self.kind {
            ElementKind::Line(linear) | ElementKind::Arrow(linear) => Some(linear),
            _ => None,
        }
    }

    /// Arrow payload; plain lines never bind.
    #[must_use]
    pub fn as_arrow(&self) -> Option<&LinearElement> {
        match &self.kind {
            ElementKind::Arrow(linear) => Some(linear),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_arrow(&self) -> bool {
        matches!(self.kind, ElementKind::Arrow(_))
    }

    #[must_use]
    pub fn is_elbow_arrow(&self) -> bool {
        self.as_arrow().is_some_and(|a| a.elbowed)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Recompute `width`/`height` of a linear element from its point hull.
    pub fn sync_linear_size(&mut self) {
        let Some(bounds) = self.as_linear().and_then(|l| Bounds::from_points(l.points.iter().copied())) else {
            return;
        };
        self.width = bounds.width();
        self.height = bounds.height();
    }

    /// Whether `boundElements` names `id` as an attached arrow.
    #[must_use]
    pub fn has_bound_arrow(&self, id: ElementId) -> bool {
        self.bound_elements.iter().any(|b| b.kind == BoundKind::Arrow && b.id == id)
    }
}

/// Copyable geometry of a bindable shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindableShape {
    pub id: ElementId,
    pub kind: BindableKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl BindableShape {
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned box of the rotated shape.
    #[must_use]
    pub fn aabb(&self) -> Bounds {
        aabb_for_rect(self.x, self.y, self.width, self.height, self.angle, None)
    }
}

/// Sparse update for an element. Only present fields are applied.
///
/// Binding fields use a nested option: `Some(None)` clears the binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub points: Option<Vec<Point>>,
    pub start_binding: Option<Option<PointBinding>>,
    pub end_binding: Option<Option<PointBinding>>,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub is_deleted: Option<bool>,
}

impl ElementUpdate {
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    #[must_use]
    pub fn geometry(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x: Some(x), y: Some(y), width: Some(width), height: Some(height), ..Self::default() }
    }

    #[must_use]
    pub fn bound_elements(bound_elements: Vec<BoundElement>) -> Self {
        Self { bound_elements: Some(bound_elements), ..Self::default() }
    }

    /// Set (or clear, with `None`) the binding at `end`.
    #[must_use]
    pub fn binding(end: EdgeEnd, binding: Option<PointBinding>) -> Self {
        Self::default().with_binding(end, binding)
    }

    #[must_use]
    pub fn with_binding(mut self, end: EdgeEnd, binding: Option<PointBinding>) -> Self {
        match end {
            EdgeEnd::Start => self.start_binding = Some(binding),
            EdgeEnd::End => self.end_binding = Some(binding),
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
