//! Outline math for bindable shapes.
//!
//! Every function works in the shape's local frame: the point is rotated by
//! `-angle` around the shape center and expressed relative to that center,
//! the answer is computed against the axis-aligned outline, then rotated back.
//! Each function matches exhaustively on [`BindableKind`], so a new shape kind
//! fails to compile until its formulas exist.

#[cfg(test)]
#[path = "intersect_test.rs"]
mod intersect_test;

use std::f64::consts::FRAC_1_SQRT_2;

use crate::consts::{BINDING_GAP_RATIO, ELLIPSE_CLOSEST_POINT_ITERATIONS, MAX_BINDING_GAP, MIN_BINDING_GAP};
use crate::element::{BindableKind, BindableShape};
use crate::geom::{Point, Vector, rotate_point};

/// Hits closer than this (squared) are the same touch point.
const HIT_MERGE_DISTANCE_SQ: f64 = 1e-12;

// ── Lines ───────────────────────────────────────────────────────

/// Normalized implicit line `n·x + m·y + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub n: f64,
    pub m: f64,
    pub c: f64,
}

impl Line {
    /// Line through `a` and `b`; `None` when the points coincide.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn through(a: Point, b: Point) -> Option<Self> {
        let len = a.distance(b);
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Self {
            n: (a.y - b.y) / len,
            m: (b.x - a.x) / len,
            c: (a.x * b.y - b.x * a.y) / len,
        })
    }

    /// Signed distance from `p`; the sign tells the side.
    #[must_use]
    pub fn signed_distance(&self, p: Point) -> f64 {
        self.n * p.x + self.m * p.y + self.c
    }
}

// ── Local frame ─────────────────────────────────────────────────

fn to_local(shape: &BindableShape, p: Point) -> Point {
    let center = shape.center();
    let unrotated = rotate_point(p, center, -shape.angle);
    Point::new(unrotated.x - center.x, unrotated.y - center.y)
}

fn to_global(shape: &BindableShape, p: Point) -> Point {
    let center = shape.center();
    rotate_point(Point::new(p.x + center.x, p.y + center.y), center, shape.angle)
}

// ── Gap ─────────────────────────────────────────────────────────

/// Largest clearance an arrow end may keep from this shape, and the
/// hit distance for "near the border".
#[must_use]
pub fn max_binding_gap(kind: BindableKind, width: f64, height: f64) -> f64 {
    let ratio = match kind {
        BindableKind::Diamond => FRAC_1_SQRT_2,
        BindableKind::Rectangle
        | BindableKind::Ellipse
        | BindableKind::Text
        | BindableKind::Image
        | BindableKind::Frame
        | BindableKind::Iframe
        | BindableKind::Embeddable => 1.0,
    };
    let smaller = width.min(height);
    MIN_BINDING_GAP.max((BINDING_GAP_RATIO * ratio * smaller).min(MAX_BINDING_GAP))
}

// ── Distance ────────────────────────────────────────────────────

/// Signed distance from `p` to the outline: negative inside, positive outside.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn distance_to_bindable_element(shape: &BindableShape, p: Point) -> f64 {
    let local = to_local(shape, p);
    let px = local.x.abs();
    let py = local.y.abs();
    let hw = shape.width / 2.0;
    let hh = shape.height / 2.0;
    match shape.kind {
        BindableKind::Rectangle
        | BindableKind::Text
        | BindableKind::Image
        | BindableKind::Frame
        | BindableKind::Iframe
        | BindableKind::Embeddable => (py - hh).max(px - hw),
        BindableKind::Diamond => {
            let norm = hh.hypot(hw);
            if norm == 0.0 {
                return px.hypot(py);
            }
            (hh * px + hw * py - hh * hw) / norm
        }
        BindableKind::Ellipse => distance_to_ellipse(hw, hh, px, py),
    }
}

/// Signed distance from a first-quadrant point to the tangent of an
/// axis-aligned ellipse with semi-axes `a`, `b`, taken at the closest outline
/// point found by fixed-point iteration from the 45° parameter.
#[allow(clippy::float_cmp)]
fn distance_to_ellipse(a: f64, b: f64, px: f64, py: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        return (px - a.max(0.0)).hypot(py - b.max(0.0));
    }
    let mut tx = FRAC_1_SQRT_2;
    let mut ty = FRAC_1_SQRT_2;
    for _ in 0..ELLIPSE_CLOSEST_POINT_ITERATIONS {
        let x = a * tx;
        let y = b * ty;
        let ex = (a * a - b * b) * tx.powi(3) / a;
        let ey = (b * b - a * a) * ty.powi(3) / b;
        let rx = x - ex;
        let ry = y - ey;
        let qx = px - ex;
        let qy = py - ey;
        let r = rx.hypot(ry);
        let q = qx.hypot(qy);
        if q == 0.0 {
            break;
        }
        tx = ((qx * r / q + ex) / a).clamp(0.0, 1.0);
        ty = ((qy * r / q + ey) / b).clamp(0.0, 1.0);
        let t = tx.hypot(ty);
        if t == 0.0 {
            break;
        }
        tx /= t;
        ty /= t;
    }
    let closest = Point::new(a * tx, b * ty);
    let along = Point::new(closest.x + ty / b, closest.y - tx / a);
    // outward normal of the tangent is (tx / a, ty / b)
    let p = Point::new(px, py);
    Line::through(closest, along).map_or_else(|| p.distance(closest), |tangent| tangent.signed_distance(p))
}

// ── Intersection ────────────────────────────────────────────────

/// Where the infinite line through `a` and `b` crosses the outline inflated
/// by `gap`.
///
/// Returns either nothing or exactly two points, nearest to `a` first. A
/// line that only grazes a single point is treated as a miss.
#[must_use]
pub fn intersect_element_with_line(shape: &BindableShape, a: Point, b: Point, gap: f64) -> Vec<Point> {
    let a_rel = to_local(shape, a);
    let b_rel = to_local(shape, b);
    let Some(line) = Line::through(a_rel, b_rel) else {
        return Vec::new();
    };
    let hw = shape.width / 2.0;
    let hh = shape.height / 2.0;

    let mut hits = match shape.kind {
        BindableKind::Rectangle
        | BindableKind::Text
        | BindableKind::Image
        | BindableKind::Frame
        | BindableKind::Iframe
        | BindableKind::Embeddable => {
            let corners = [Point::new(hw, hh), Point::new(hw, -hh), Point::new(-hw, -hh), Point::new(-hw, hh)];
            polygon_hits(&corners, &line, a_rel, b_rel, gap)
        }
        BindableKind::Diamond => {
            let corners = [Point::new(0.0, hh), Point::new(hw, 0.0), Point::new(0.0, -hh), Point::new(-hw, 0.0)];
            polygon_hits(&corners, &line, a_rel, b_rel, gap)
        }
        BindableKind::Ellipse => ellipse_hits(hw + gap, hh + gap, a_rel, b_rel),
    };

    hits.sort_by(|p, q| p.distance_sq(a_rel).total_cmp(&q.distance_sq(a_rel)));
    hits.dedup_by(|p, q| p.distance_sq(*q) < HIT_MERGE_DISTANCE_SQ);
    if hits.len() < 2 {
        return Vec::new();
    }
    let nearest = hits[0];
    let farthest = hits[hits.len() - 1];
    vec![to_global(shape, nearest), to_global(shape, farthest)]
}

/// Hits against each edge pushed outward by `gap`, plus the corner arcs.
#[allow(clippy::float_cmp)]
fn polygon_hits(corners: &[Point; 4], line: &Line, a: Point, b: Point, gap: f64) -> Vec<Point> {
    let mut hits = Vec::new();
    for i in 0..corners.len() {
        let start = corners[i];
        let end = corners[(i + 1) % corners.len()];
        let edge = end - start;
        let len = edge.magnitude();
        if len == 0.0 {
            continue;
        }
        let mut normal = Vector::new(edge.y / len, -edge.x / len);
        let mid = Vector::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
        if normal.dot(mid) < 0.0 {
            normal = normal * -1.0;
        }
        let offset = normal * gap;
        if let Some(hit) = segment_hit(line, start + offset, end + offset) {
            hits.push(hit);
        }
    }
    for corner in corners {
        hits.extend(circle_hits(*corner, gap, line, a, b));
    }
    hits
}

/// Crossing of `line` with segment `p → q`; touching an endpoint is a miss.
fn segment_hit(line: &Line, p: Point, q: Point) -> Option<Point> {
    let dist_p = line.signed_distance(p);
    let dist_q = line.signed_distance(q);
    if dist_p * dist_q >= 0.0 {
        return None;
    }
    let t = dist_p / (dist_p - dist_q);
    Some(p + (q - p) * t)
}

#[allow(clippy::float_cmp)]
fn circle_hits(center: Point, radius: f64, line: &Line, a: Point, b: Point) -> Vec<Point> {
    if radius == 0.0 {
        return if line.signed_distance(center).abs() < 1e-9 { vec![center] } else { Vec::new() };
    }
    let d = b - a;
    let f = a - center;
    let qa = d.dot(d);
    let qb = 2.0 * f.dot(d);
    let qc = f.dot(f) - radius * radius;
    quadratic_roots(qa, qb, qc).into_iter().map(|t| a + d * t).collect()
}

fn ellipse_hits(semi_x: f64, semi_y: f64, a: Point, b: Point) -> Vec<Point> {
    if semi_x <= 0.0 || semi_y <= 0.0 {
        return Vec::new();
    }
    let d = b - a;
    let (sx2, sy2) = (semi_x * semi_x, semi_y * semi_y);
    let qa = d.x * d.x / sx2 + d.y * d.y / sy2;
    let qb = 2.0 * (a.x * d.x / sx2 + a.y * d.y / sy2);
    let qc = a.x * a.x / sx2 + a.y * a.y / sy2 - 1.0;
    quadratic_roots(qa, qb, qc).into_iter().map(|t| a + d * t).collect()
}

/// Two distinct real roots, or none (tangency counts as none).
#[allow(clippy::float_cmp)]
fn quadratic_roots(qa: f64, qb: f64, qc: f64) -> Vec<f64> {
    if qa == 0.0 {
        return Vec::new();
    }
    let disc = qb * qb - 4.0 * qa * qc;
    if disc <= 0.0 || !disc.is_finite() {
        return Vec::new();
    }
    let root = disc.sqrt();
    vec![(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
}

// ── Focus ───────────────────────────────────────────────────────

/// Signed ratio locating where the line `a → b` is tangent to a scaled copy
/// of the outline. Zero for degenerate input.
#[must_use]
pub fn determine_focus_distance(shape: &BindableShape, a: Point, b: Point) -> f64 {
    let a_rel = to_local(shape, a);
    let b_rel = to_local(shape, b);
    let Some(line) = Line::through(a_rel, b_rel) else {
        return 0.0;
    };
    let hw = shape.width / 2.0;
    let hh = shape.height / 2.0;
    let q = shape.height / shape.width;
    let n_abs = line.n.abs();
    let m_abs = line.m.abs();
    let focus = match shape.kind {
        BindableKind::Rectangle
        | BindableKind::Text
        | BindableKind::Image
        | BindableKind::Frame
        | BindableKind::Iframe
        | BindableKind::Embeddable => line.c / (hw * (n_abs + q * m_abs)),
        BindableKind::Diamond => {
            if m_abs < n_abs {
                line.c / (n_abs * hw)
            } else {
                line.c / (m_abs * hh)
            }
        }
        BindableKind::Ellipse => line.c / (hw * (line.n * line.n + q * q * line.m * line.m).sqrt()),
    };
    if focus.is_finite() { focus } else { 0.0 }
}

/// Inverse of [`determine_focus_distance`]: the tangent point on the outline
/// scaled by `|focus|` that a line from `adjacent` touches on the side given
/// by the sign of `focus`.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn determine_focus_point(shape: &BindableShape, focus: f64, adjacent: Point) -> Point {
    if focus == 0.0 {
        return shape.center();
    }
    let adjacent_rel = to_local(shape, adjacent);
    let scale = focus.abs();
    let hw = shape.width / 2.0 * scale;
    let hh = shape.height / 2.0 * scale;
    let candidates = match shape.kind {
        BindableKind::Rectangle
        | BindableKind::Text
        | BindableKind::Image
        | BindableKind::Frame
        | BindableKind::Iframe
        | BindableKind::Embeddable => {
            vec![Point::new(hw, hh), Point::new(hw, -hh), Point::new(-hw, -hh), Point::new(-hw, hh)]
        }
        BindableKind::Diamond => {
            vec![Point::new(0.0, hh), Point::new(hw, 0.0), Point::new(0.0, -hh), Point::new(-hw, 0.0)]
        }
        BindableKind::Ellipse => ellipse_tangent_points(hw, hh, adjacent_rel),
    };
    let orientation = focus.signum();
    let mut best: Option<(f64, Point)> = None;
    for candidate in candidates {
        let Some(line) = Line::through(adjacent_rel, candidate) else {
            continue;
        };
        let distance = orientation * line.c;
        if distance > best.map_or(0.0, |(d, _)| d) {
            best = Some((distance, candidate));
        }
    }
    match best {
        Some((_, point)) => to_global(shape, point),
        None => shape.center(),
    }
}

/// Both tangent points on the ellipse with semi-axes `a`, `b` as seen from `p`.
#[allow(clippy::float_cmp)]
fn ellipse_tangent_points(a: f64, b: f64, p: Point) -> Vec<Point> {
    let px = p.x;
    let py = if p.y == 0.0 { 0.0001 } else { p.y };
    let (a2, b2) = (a * a, b * b);
    let squares = px * px * b2 + py * py * a2;
    if squares == 0.0 {
        return Vec::new();
    }
    let root = (squares - a2 * b2).max(0.0).sqrt();
    [1.0, -1.0]
        .into_iter()
        .filter_map(|orientation: f64| {
            // Tangent line m·x + n·y + 1 = 0
            let m = (-px * b2 + orientation * py * root) / squares;
            let mut n = (-m * px - 1.0) / py;
            if n == 0.0 {
                n = if n.is_sign_negative() { -0.01 } else { 0.01 };
            }
            let denom = n * n * b2 + m * m * a2;
            if denom == 0.0 {
                return None;
            }
            let x = -(a2 * m) / denom;
            let point = Point::new(x, (-m * x - 1.0) / n);
            point.is_finite().then_some(point)
        })
        .collect()
}
