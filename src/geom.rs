//! Geometry kernel: points, vectors, bounds, rotation and bezier helpers.
//!
//! Everything here is a pure function over plain `Copy` values. World space
//! is y-down (screen convention), angles are radians, positive clockwise on
//! screen.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point in world or element-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn translate(self, v: Vector) -> Self {
        Self { x: self.x + v.x, y: self.y + v.y }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Manhattan (taxicab) distance.
    #[must_use]
    pub fn manhattan(self, other: Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Scale this point away from (or towards) `origin` by `factor`.
    #[must_use]
    pub fn scale_from(self, origin: Self, factor: f64) -> Self {
        origin.translate((self - origin) * factor)
    }

    /// Rotate around `center` by `angle` radians.
    #[must_use]
    pub fn rotate(self, center: Self, angle: f64) -> Self {
        rotate_point(self, center, angle)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vector {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector pointing from `origin` to `p`.
    #[must_use]
    pub fn from_points(p: Point, origin: Point) -> Self {
        p - origin
    }

    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Self) -> Vector {
        Vector { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        self.translate(rhs)
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: Vector) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Per-side inflation of a bounding box, in the order top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Offsets {
    #[must_use]
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    #[must_use]
    pub fn uniform(value: f64) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Square box of half-size `half` centered on `p`.
    #[must_use]
    pub fn around(p: Point, half: f64) -> Self {
        Self::new(p.x - half, p.y - half, p.x + half, p.y + half)
    }

    /// Smallest box containing every point; `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.x, p.y, p.x, p.y),
                Some(b) => Self::new(b.min_x.min(p.x), b.min_y.min(p.y), b.max_x.max(p.x), b.max_y.max(p.y)),
            })
        })
    }

    /// Smallest box containing every box; `None` for an empty iterator.
    pub fn common<I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = Bounds>,
    {
        boxes.into_iter().reduce(|a, b| a.union(b))
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Strict containment: points on the border are outside.
    #[must_use]
    pub fn contains_strict(&self, p: Point) -> bool {
        p.x > self.min_x && p.x < self.max_x && p.y > self.min_y && p.y < self.max_y
    }

    /// Inclusive containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Open-interval overlap: boxes that only touch do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x && self.max_x > other.min_x && self.min_y < other.max_y && self.max_y > other.min_y
    }

    #[must_use]
    pub fn inflate(self, offsets: Offsets) -> Self {
        Self::new(
            self.min_x - offsets.left,
            self.min_y - offsets.top,
            self.max_x + offsets.right,
            self.max_y + offsets.bottom,
        )
    }

    #[must_use]
    pub fn translate(self, v: Vector) -> Self {
        Self::new(self.min_x + v.x, self.min_y + v.y, self.max_x + v.x, self.max_y + v.y)
    }
}

/// Rotate `p` around `center` by `angle` radians.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return p;
    }
    let (sin, cos) = angle.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(dx * cos - dy * sin + center.x, dx * sin + dy * cos + center.y)
}

/// Normalize an angle into `[0, 2π)`.
#[must_use]
pub fn normalize_radians(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let a = angle % tau;
    if a < 0.0 { a + tau } else { a }
}

/// Axis-aligned box of a `width × height` rectangle at `(x, y)` rotated by
/// `angle` around its center, optionally inflated per side.
#[must_use]
pub fn aabb_for_rect(x: f64, y: f64, width: f64, height: f64, angle: f64, offsets: Option<Offsets>) -> Bounds {
    let center = Point::new(x + width / 2.0, y + height / 2.0);
    let corners = [
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ]
    .map(|corner| rotate_point(corner, center, angle));
    let bounds = Bounds::from_points(corners).unwrap_or_default();
    match offsets {
        Some(offsets) => bounds.inflate(offsets),
        None => bounds,
    }
}

/// Whether `p` lies inside (or on the border of) triangle `abc`, in either winding.
#[must_use]
pub fn triangle_includes_point(a: Point, b: Point, c: Point, p: Point) -> bool {
    fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    }
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

// ── Bezier curves ───────────────────────────────────────────────

/// A cubic bezier segment: start, two handles, end.
pub type Cubic = [Point; 4];

#[must_use]
pub fn quadratic_at(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

#[must_use]
pub fn cubic_at(curve: &Cubic, t: f64) -> Point {
    let [p0, p1, p2, p3] = *curve;
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Exact bounds of a quadratic segment.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn quadratic_bounds(p0: Point, p1: Point, p2: Point) -> Bounds {
    let mut points = vec![p0, p2];
    for (a, b, c) in [(p0.x, p1.x, p2.x), (p0.y, p1.y, p2.y)] {
        let denom = a - 2.0 * b + c;
        if denom != 0.0 {
            let t = (a - b) / denom;
            if t > 0.0 && t < 1.0 {
                points.push(quadratic_at(p0, p1, p2, t));
            }
        }
    }
    Bounds::from_points(points).unwrap_or_default()
}

/// Exact bounds of a cubic segment, from the roots of its derivative.
#[must_use]
pub fn cubic_bounds(curve: &Cubic) -> Bounds {
    let [p0, p1, p2, p3] = *curve;
    let mut points = vec![p0, p3];
    for (v0, v1, v2, v3) in [(p0.x, p1.x, p2.x, p3.x), (p0.y, p1.y, p2.y, p3.y)] {
        // Derivative / 3 = a t² + b t + c
        let a = -v0 + 3.0 * v1 - 3.0 * v2 + v3;
        let b = 2.0 * (v0 - 2.0 * v1 + v2);
        let c = v1 - v0;
        for t in derivative_roots(a, b, c) {
            if t > 0.0 && t < 1.0 {
                points.push(cubic_at(curve, t));
            }
        }
    }
    Bounds::from_points(points).unwrap_or_default()
}

fn derivative_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    vec![(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)]
}

/// Evenly sample a cubic segment, endpoints included.
#[must_use]
pub fn sample_cubic(curve: &Cubic, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / segments as f64;
    (0..=segments)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 * step;
            cubic_at(curve, t)
        })
        .collect()
}

/// Convert a polyline into cubic segments passing through every point,
/// with handles derived Catmull-Rom style.
#[must_use]
pub fn catmull_rom_cubics(points: &[Point], tension: f64) -> Vec<Cubic> {
    if points.len() < 2 {
        return Vec::new();
    }
    let last = points.len() - 1;
    (0..last)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[(i + 1).min(last)];
            let p3 = points[(i + 2).min(last)];
            let t1 = (p2 - p0) * tension;
            let t2 = (p3 - p1) * tension;
            [p1, p1 + t1 * (1.0 / 3.0), p2 - t2 * (1.0 / 3.0), p2]
        })
        .collect()
}
