//! Transform orchestration for drag, rotate, and resize gestures.
//!
//! Each entry point applies ordinary affine math to the selection, then asks
//! the binding engine to bring dependent arrows back onto the shapes that
//! moved. Arrows inside the selection are passed as the simultaneously
//! updated set so they are not moved twice. Elbow arrows are never rotated;
//! they are routed again instead.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::f64::consts::PI;

use tracing::debug;

use crate::binding::{UpdateBoundOptions, update_bound_elements};
use crate::config::BindingConfig;
use crate::consts::MIN_ELEMENT_SIZE;
use crate::element::{Element, ElementId, ElementUpdate, LinearElement};
use crate::error::RouteError;
use crate::geom::{Bounds, Point, Vector, normalize_radians, rotate_point};
use crate::input::{Modifiers, ResizeAnchor};
use crate::linear::{self, PointMove};
use crate::route::{self, RouteOptions};
use crate::scene::Scene;

fn is_elbow_bound_outside(scene: &Scene, id: &ElementId, selected: &[ElementId]) -> bool {
    scene.get_non_deleted(id).and_then(Element::as_arrow).is_some_and(|linear| {
        linear.elbowed
            && [linear.start_binding, linear.end_binding]
                .iter()
                .flatten()
                .any(|b| !selected.contains(&b.element_id))
    })
}

fn update_all_bound(
    scene: &mut Scene,
    config: &BindingConfig,
    changed: &[(ElementId, Option<(f64, f64)>)],
    selected: &[ElementId],
) -> Vec<RouteError> {
    let mut errors = Vec::new();
    for (id, resized_from) in changed {
        let options = UpdateBoundOptions { simultaneously_updated: selected, resized_from: *resized_from };
        errors.extend(update_bound_elements(scene, config, id, &options));
    }
    errors
}

fn reroute(scene: &mut Scene, config: &BindingConfig, id: &ElementId, errors: &mut Vec<RouteError>) {
    if let Err(err) = route::reroute_elbow_arrow(scene, config, id) {
        errors.push(err);
    }
}

// ── Drag ────────────────────────────────────────────────────────

/// Translate every selected element by `delta`.
///
/// Selected elbow arrows bound to a shape outside the selection are routed
/// again so their bound ends stay put.
pub fn drag_selected_elements(
    scene: &mut Scene,
    config: &BindingConfig,
    selected: &[ElementId],
    delta: Vector,
) -> Vec<RouteError> {
    let mut changed = Vec::new();
    for id in selected {
        let Some(el) = scene.get_non_deleted(id) else {
            continue;
        };
        let next = Point::new(el.x, el.y).translate(delta);
        let bindable = el.as_bindable().is_some();
        scene.mutate(id, &ElementUpdate::position(next.x, next.y));
        if bindable {
            changed.push((*id, None));
        }
    }

    let mut errors = update_all_bound(scene, config, &changed, selected);
    for id in selected {
        if is_elbow_bound_outside(scene, id, selected) {
            reroute(scene, config, id, &mut errors);
        }
    }
    errors
}

// ── Rotate ──────────────────────────────────────────────────────

/// Angle of an element whose rotate handle is dragged to `pointer`.
///
/// Straight up from `center` is zero. With `snap_step` the angle lands on a
/// multiple of the step, rounding to the nearest.
#[must_use]
pub fn rotation_angle(center: Point, pointer: Point, snap_step: Option<f64>) -> f64 {
    let mut angle = 5.0 * PI / 2.0 + (pointer.y - center.y).atan2(pointer.x - center.x);
    if let Some(step) = snap_step.filter(|step| *step > 0.0) {
        angle += step / 2.0;
        angle -= angle % step;
    }
    normalize_radians(angle)
}

/// Rotate one element so its rotate handle points at `pointer`.
pub fn rotate_single(
    scene: &mut Scene,
    config: &BindingConfig,
    id: &ElementId,
    pointer: Point,
    modifiers: Modifiers,
) -> Vec<RouteError> {
    let Some(el) = scene.get_non_deleted(id) else {
        return Vec::new();
    };
    if el.is_elbow_arrow() {
        debug!(%id, "rotation skipped for elbow arrow");
        return Vec::new();
    }
    let snap = modifiers.shift.then(|| config.rotation_snap_radians());
    let angle = rotation_angle(linear::element_center(el), pointer, snap);
    scene.mutate(id, &ElementUpdate { angle: Some(angle), ..ElementUpdate::default() });
    update_bound_elements(scene, config, id, &UpdateBoundOptions::default())
}

/// Rotate every selected element by `delta` radians around `center`.
///
/// Elbow arrows keep a zero angle: their free ends are rotated and the route
/// is recomputed once the shapes have moved.
pub fn rotate_multiple(
    scene: &mut Scene,
    config: &BindingConfig,
    selected: &[ElementId],
    center: Point,
    delta: f64,
) -> Vec<RouteError> {
    let mut changed = Vec::new();
    let mut elbows = Vec::new();
    for id in selected {
        let Some(el) = scene.get_non_deleted(id) else {
            continue;
        };
        if el.is_elbow_arrow() {
            let points = linear::absolute_points(el);
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                let moves = vec![
                    PointMove { index: 0, point: linear::point_from_absolute(el, rotate_point(*first, center, delta)) },
                    PointMove {
                        index: points.len() - 1,
                        point: linear::point_from_absolute(el, rotate_point(*last, center, delta)),
                    },
                ];
                elbows.push((*id, moves));
            }
            continue;
        }
        let old_center = linear::element_center(el);
        let new_center = rotate_point(old_center, center, delta);
        let update = ElementUpdate {
            x: Some(el.x + new_center.x - old_center.x),
            y: Some(el.y + new_center.y - old_center.y),
            angle: Some(normalize_radians(el.angle + delta)),
            ..ElementUpdate::default()
        };
        if el.as_bindable().is_some() {
            changed.push((*id, None));
        }
        scene.mutate(id, &update);
    }

    let mut errors = update_all_bound(scene, config, &changed, selected);
    for (id, moves) in elbows {
        if let Err(err) =
            linear::move_points(scene, config, &id, &moves, ElementUpdate::default(), RouteOptions::default())
        {
            errors.push(err);
        }
    }
    errors
}

// ── Resize ──────────────────────────────────────────────────────

/// New unrotated box for a box `orig` rotated by `angle` whose `anchor`
/// handle is dragged to `pointer`.
///
/// The opposite handle (or the center with alt) stays fixed in world space.
/// Shift keeps the aspect ratio. Sizes never drop below `MIN_ELEMENT_SIZE`.
#[must_use]
pub fn resize_box(orig: Bounds, angle: f64, anchor: ResizeAnchor, pointer: Point, modifiers: Modifiers) -> Bounds {
    let (width, height) = (orig.width(), orig.height());
    let center = orig.center();
    let local = rotate_point(pointer, center, -angle);
    let (hx, hy) = anchor.handle_fraction();
    let (fx, fy) = anchor.pivot_fraction(modifiers.alt);
    let pivot = Point::new(orig.min_x + fx * width, orig.min_y + fy * height);

    let mut next_width = if anchor.moves_x() { (local.x - pivot.x) / (hx - fx) } else { width };
    let mut next_height = if anchor.moves_y() { (local.y - pivot.y) / (hy - fy) } else { height };
    next_width = next_width.max(MIN_ELEMENT_SIZE);
    next_height = next_height.max(MIN_ELEMENT_SIZE);

    if modifiers.shift && width > 0.0 && height > 0.0 {
        if anchor.is_corner() {
            let scale = (next_width / width).max(next_height / height);
            next_width = width * scale;
            next_height = height * scale;
        } else if anchor.moves_x() {
            next_height = height * next_width / width;
        } else {
            next_width = width * next_height / height;
        }
    }

    let pivot_world = rotate_point(pivot, center, angle);
    let to_center = rotate_point(Point::new((0.5 - fx) * next_width, (0.5 - fy) * next_height), Point::default(), angle);
    let next_center = Point::new(pivot_world.x + to_center.x, pivot_world.y + to_center.y);
    Bounds::new(
        next_center.x - next_width / 2.0,
        next_center.y - next_height / 2.0,
        next_center.x + next_width / 2.0,
        next_center.y + next_height / 2.0,
    )
}

/// Resize one element from its state at gesture start (`orig`).
///
/// Shapes take the new box directly and drag their bound arrows along, with
/// gaps scaled to the new size. Lines and arrows scale their points into the
/// new box; elbow arrows are routed again afterwards.
pub fn resize_single(
    scene: &mut Scene,
    config: &BindingConfig,
    orig: &Element,
    anchor: ResizeAnchor,
    pointer: Point,
    modifiers: Modifiers,
) -> Vec<RouteError> {
    let id = orig.id;
    let Some(current) = scene.get_non_deleted(&id) else {
        return Vec::new();
    };
    let resized_from = (current.width, current.height);

    if let Some(linear) = orig.as_linear() {
        return resize_linear(scene, config, orig, linear, anchor, pointer, modifiers);
    }

    let orig_box = Bounds::new(orig.x, orig.y, orig.x + orig.width, orig.y + orig.height);
    let next = resize_box(orig_box, orig.angle, anchor, pointer, modifiers);
    scene.mutate(&id, &ElementUpdate::geometry(next.min_x, next.min_y, next.width(), next.height()));
    let options = UpdateBoundOptions { simultaneously_updated: &[], resized_from: Some(resized_from) };
    update_bound_elements(scene, config, &id, &options)
}

fn resize_linear(
    scene: &mut Scene,
    config: &BindingConfig,
    orig: &Element,
    linear: &LinearElement,
    anchor: ResizeAnchor,
    pointer: Point,
    modifiers: Modifiers,
) -> Vec<RouteError> {
    let local = linear::local_bounds(&linear.points, linear.rounded);
    let orig_box = local.translate(Vector::new(orig.x, orig.y));
    let next = resize_box(orig_box, orig.angle, anchor, pointer, modifiers);
    let scale = |next_size: f64, size: f64| if size > 0.0 { next_size / size } else { 1.0 };
    let (sx, sy) = (scale(next.width(), local.width()), scale(next.height(), local.height()));

    let scaled: Vec<Point> = linear
        .points
        .iter()
        .map(|p| Point::new(local.min_x + (p.x - local.min_x) * sx, local.min_y + (p.y - local.min_y) * sy))
        .collect();
    let origin = scaled.first().copied().unwrap_or_default();
    let points: Vec<Point> = scaled.iter().map(|p| Point::new(p.x - origin.x, p.y - origin.y)).collect();
    let bounds = linear::local_bounds(&points, linear.rounded);
    let target = next.center();
    let update = ElementUpdate {
        x: Some(target.x - bounds.center().x),
        y: Some(target.y - bounds.center().y),
        points: Some(points),
        ..ElementUpdate::default()
    };
    scene.mutate(&orig.id, &update);

    let mut errors = Vec::new();
    if linear.elbowed {
        reroute(scene, config, &orig.id, &mut errors);
    }
    errors
}

/// Scale a multi-element selection uniformly from its state at gesture start.
///
/// `orig_bounds` is the common box of `originals`. Corner handles use the
/// larger of the two axis ratios; side handles the one axis they move. The
/// pivot is the handle opposite `anchor`, or the center with alt.
pub fn resize_multiple(
    scene: &mut Scene,
    config: &BindingConfig,
    originals: &[Element],
    orig_bounds: Bounds,
    anchor: ResizeAnchor,
    pointer: Point,
    modifiers: Modifiers,
) -> Vec<RouteError> {
    let (width, height) = (orig_bounds.width(), orig_bounds.height());
    let (hx, hy) = anchor.handle_fraction();
    let (fx, fy) = anchor.pivot_fraction(modifiers.alt);
    let pivot = Point::new(orig_bounds.min_x + fx * width, orig_bounds.min_y + fy * height);

    let scale_x = (anchor.moves_x() && width > 0.0).then(|| (pointer.x - pivot.x) / ((hx - fx) * width));
    let scale_y = (anchor.moves_y() && height > 0.0).then(|| (pointer.y - pivot.y) / ((hy - fy) * height));
    let scale = match (scale_x, scale_y) {
        (Some(sx), Some(sy)) => sx.max(sy),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => return Vec::new(),
    };
    if !(scale.is_finite() && scale > 0.0) {
        debug!(scale, "multi-element resize skipped: degenerate scale");
        return Vec::new();
    }

    let selected: Vec<ElementId> = originals.iter().map(|el| el.id).collect();
    let mut changed = Vec::new();
    let mut elbows = Vec::new();
    for orig in originals {
        let Some(current) = scene.get_non_deleted(&orig.id) else {
            continue;
        };
        let resized_from = (current.width, current.height);
        let mut update = ElementUpdate::position(pivot.x + (orig.x - pivot.x) * scale, pivot.y + (orig.y - pivot.y) * scale);
        match orig.as_linear() {
            Some(linear) => {
                update.points = Some(linear.points.iter().map(|p| Point::new(p.x * scale, p.y * scale)).collect());
                if linear.elbowed {
                    elbows.push(orig.id);
                }
            }
            None => {
                update.width = Some(orig.width * scale);
                update.height = Some(orig.height * scale);
                changed.push((orig.id, Some(resized_from)));
            }
        }
        scene.mutate(&orig.id, &update);
    }

    let mut errors = update_all_bound(scene, config, &changed, &selected);
    for id in &elbows {
        reroute(scene, config, id, &mut errors);
    }
    errors
}
