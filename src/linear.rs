//! Point geometry of lines and arrows.
//!
//! A linear element stores its points relative to `(x, y)`, with the first
//! point at the origin, and rotates them by `angle` around the center of
//! their bounds. This module converts between that local form and world
//! coordinates, and provides [`move_points`], the one primitive through which
//! bound endpoints are repositioned.

#[cfg(test)]
#[path = "linear_test.rs"]
mod linear_test;

use crate::config::BindingConfig;
use crate::consts::CURVE_TENSION;
use crate::element::{Element, ElementId, ElementUpdate, LinearElement};
use crate::error::RouteError;
use crate::geom::{Bounds, Point, Vector, aabb_for_rect, catmull_rom_cubics, cubic_bounds, rotate_point, sample_cubic};
use crate::route::{self, RouteOptions};
use crate::scene::Scene;

/// Samples per cubic segment when bounding a rotated curve.
const ROTATED_CURVE_SAMPLES: usize = 16;

/// A requested new position for one point, in the element's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMove {
    pub index: usize,
    pub point: Point,
}

/// Bounds of the local points; curves are bounded exactly.
#[must_use]
pub fn local_bounds(points: &[Point], rounded: bool) -> Bounds {
    if rounded && points.len() > 2 {
        if let Some(bounds) = Bounds::common(catmull_rom_cubics(points, CURVE_TENSION).iter().map(cubic_bounds)) {
            return bounds;
        }
    }
    Bounds::from_points(points.iter().copied()).unwrap_or_default()
}

/// Rotation center of a linear element in world space.
#[must_use]
pub fn linear_center(el: &Element, linear: &LinearElement) -> Point {
    let local = local_bounds(&linear.points, linear.rounded);
    Point::new(el.x + (local.min_x + local.max_x) / 2.0, el.y + (local.min_y + local.max_y) / 2.0)
}

/// Rotation center of any element.
#[must_use]
pub fn element_center(el: &Element) -> Point {
    match el.as_linear() {
        Some(linear) => linear_center(el, linear),
        None => el.center(),
    }
}

/// All points of a linear element in world space.
#[must_use]
pub fn absolute_points(el: &Element) -> Vec<Point> {
    let Some(linear) = el.as_linear() else {
        return Vec::new();
    };
    let center = linear_center(el, linear);
    linear
        .points
        .iter()
        .map(|p| rotate_point(Point::new(el.x + p.x, el.y + p.y), center, el.angle))
        .collect()
}

/// World position of the point at `index`.
#[must_use]
pub fn point_at_index_global(el: &Element, index: usize) -> Option<Point> {
    let linear = el.as_linear()?;
    let p = linear.points.get(index)?;
    let center = linear_center(el, linear);
    Some(rotate_point(Point::new(el.x + p.x, el.y + p.y), center, el.angle))
}

/// Local position of world point `p` for this element.
#[must_use]
pub fn point_from_absolute(el: &Element, p: Point) -> Point {
    let center = element_center(el);
    let unrotated = rotate_point(p, center, -el.angle);
    Point::new(unrotated.x - el.x, unrotated.y - el.y)
}

/// Absolute axis-aligned bounds of any element.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn element_bounds(el: &Element) -> Bounds {
    let Some(linear) = el.as_linear() else {
        return aabb_for_rect(el.x, el.y, el.width, el.height, el.angle, None);
    };
    let offset = Vector::new(el.x, el.y);
    if el.angle == 0.0 {
        return local_bounds(&linear.points, linear.rounded).translate(offset);
    }
    let center = linear_center(el, linear);
    let outline: Vec<Point> = if linear.rounded && linear.points.len() > 2 {
        catmull_rom_cubics(&linear.points, CURVE_TENSION)
            .iter()
            .flat_map(|curve| sample_cubic(curve, ROTATED_CURVE_SAMPLES))
            .collect()
    } else {
        linear.points.clone()
    };
    Bounds::from_points(outline.into_iter().map(|p| rotate_point(p + offset, center, el.angle))).unwrap_or_default()
}

/// Move points of a linear element, keeping the first point at the local origin.
///
/// Moving point 0 shifts the element's position and every other point by
/// the opposite amount. `other` is merged into the same mutation (typically
/// refreshed bindings). Elbow arrows are re-routed instead of having their
/// points set directly.
///
/// # Errors
///
/// Returns a [`RouteError`] when the element is missing, or when an elbow
/// arrow cannot be routed (its previous points are kept).
pub fn move_points(
    scene: &mut Scene,
    config: &BindingConfig,
    id: &ElementId,
    targets: &[PointMove],
    other: ElementUpdate,
    options: RouteOptions,
) -> Result<(), RouteError> {
    let Some(el) = scene.get_non_deleted(id) else {
        return Err(RouteError::NotFound(*id));
    };
    let Some(linear) = el.as_linear() else {
        return Err(RouteError::NotFound(*id));
    };
    let points = &linear.points;

    let offset = targets
        .iter()
        .find(|t| t.index == 0)
        .and_then(|t| points.first().map(|origin| t.point - *origin))
        .unwrap_or_default();

    let next_points: Vec<Point> = points
        .iter()
        .enumerate()
        .map(|(idx, p)| match targets.iter().find(|t| t.index == idx) {
            Some(_) if idx == 0 => *p,
            Some(target) => target.point - offset,
            None => *p - offset,
        })
        .collect();

    if el.is_elbow_arrow() {
        return route::mutate_elbow_arrow(scene, config, id, next_points, offset, other, options);
    }

    let prev_bounds = local_bounds(points, linear.rounded);
    let next_bounds = local_bounds(&next_points, linear.rounded);
    let pivot = Point::new(
        (prev_bounds.min_x + prev_bounds.max_x) / 2.0 - (next_bounds.min_x + next_bounds.max_x) / 2.0,
        (prev_bounds.min_y + prev_bounds.max_y) / 2.0 - (next_bounds.min_y + next_bounds.max_y) / 2.0,
    );
    let shift = rotate_point(Point::new(offset.x, offset.y), pivot, el.angle);
    let update = ElementUpdate {
        x: Some(el.x + shift.x),
        y: Some(el.y + shift.y),
        points: Some(next_points),
        ..other
    };
    scene.mutate(id, &update);
    Ok(())
}
