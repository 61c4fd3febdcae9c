//! Cardinal headings and the classifiers that pick one.
//!
//! Headings constrain elbow routing: an endpoint leaves (or enters) its shape
//! along exactly one of four directions.

#[cfg(test)]
#[path = "heading_test.rs"]
mod heading_test;

use serde::{Deserialize, Serialize};

use crate::consts::SEARCH_CONE_MULTIPLIER;
use crate::element::{BindableKind, BindableShape};
use crate::geom::{Bounds, Point, Vector, normalize_radians, triangle_includes_point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    /// All headings in neighbor-expansion order.
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    /// Unit vector in y-down world space.
    #[must_use]
    pub fn vector(self) -> Vector {
        match self {
            Self::Up => Vector::new(0.0, -1.0),
            Self::Right => Vector::new(1.0, 0.0),
            Self::Down => Vector::new(0.0, 1.0),
            Self::Left => Vector::new(-1.0, 0.0),
        }
    }

    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Classify a direction by its dominant axis.
    ///
    /// Horizontal wins ties; the zero vector maps to `Left`.
    #[must_use]
    pub fn from_vector(v: Vector) -> Self {
        let abs_x = v.x.abs();
        let abs_y = v.y.abs();
        if v.x > abs_y {
            Self::Right
        } else if v.x <= -abs_y {
            Self::Left
        } else if v.y > abs_x {
            Self::Down
        } else {
            Self::Up
        }
    }

    /// Heading of the segment running from `from` to `to`.
    #[must_use]
    pub fn between(from: Point, to: Point) -> Self {
        Self::from_vector(to - from)
    }
}

/// Bucket the angle of segment `a → b` into 90° sectors offset by 45°.
#[must_use]
pub fn heading_for_diamond(a: Point, b: Point) -> Heading {
    let angle = normalize_radians((b.y - a.y).atan2(b.x - a.x)).to_degrees();
    if !(45.0..315.0).contains(&angle) {
        Heading::Up
    } else if angle < 135.0 {
        Heading::Right
    } else if angle < 225.0 {
        Heading::Down
    } else {
        Heading::Left
    }
}

/// Which side of `shape` the point `p` lies on, judged by four search cones
/// cast from the center of `aabb` and scaled outward.
#[must_use]
pub fn heading_for_point_from_element(shape: &BindableShape, aabb: Bounds, p: Point) -> Heading {
    let mid = aabb.center();

    if shape.kind == BindableKind::Diamond {
        if p.x < shape.x {
            return Heading::Left;
        } else if p.y < shape.y {
            return Heading::Up;
        } else if p.x > shape.x + shape.width {
            return Heading::Right;
        } else if p.y > shape.y + shape.height {
            return Heading::Down;
        }

        let cone = |corner: Point| corner.scale_from(mid, SEARCH_CONE_MULTIPLIER).rotate(mid, shape.angle);
        let top = cone(Point::new(shape.x + shape.width / 2.0, shape.y));
        let right = cone(Point::new(shape.x + shape.width, shape.y + shape.height / 2.0));
        let bottom = cone(Point::new(shape.x + shape.width / 2.0, shape.y + shape.height));
        let left = cone(Point::new(shape.x, shape.y + shape.height / 2.0));

        return if triangle_includes_point(top, right, mid, p) {
            heading_for_diamond(top, right)
        } else if triangle_includes_point(right, bottom, mid, p) {
            heading_for_diamond(right, bottom)
        } else if triangle_includes_point(bottom, left, mid, p) {
            heading_for_diamond(bottom, left)
        } else {
            heading_for_diamond(left, top)
        };
    }

    let top_left = Point::new(aabb.min_x, aabb.min_y).scale_from(mid, SEARCH_CONE_MULTIPLIER);
    let top_right = Point::new(aabb.max_x, aabb.min_y).scale_from(mid, SEARCH_CONE_MULTIPLIER);
    let bottom_left = Point::new(aabb.min_x, aabb.max_y).scale_from(mid, SEARCH_CONE_MULTIPLIER);
    let bottom_right = Point::new(aabb.max_x, aabb.max_y).scale_from(mid, SEARCH_CONE_MULTIPLIER);

    if triangle_includes_point(top_left, top_right, mid, p) {
        Heading::Up
    } else if triangle_includes_point(top_right, bottom_right, mid, p) {
        Heading::Right
    } else if triangle_includes_point(bottom_right, bottom_left, mid, p) {
        Heading::Down
    } else {
        Heading::Left
    }
}
