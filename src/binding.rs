//! Binding maintenance: attaching arrow ends to shapes and keeping them
//! attached.
//!
//! An arrow end is either unbound or bound to one shape through a
//! [`PointBinding`]. Binding computes the focus and gap from the current
//! geometry (plus a fixed point for elbow arrows). Whenever the shape moves
//! or resizes, [`update_bound_elements`] puts every dependent end back at the
//! same relative spot. Deletion and duplication keep both directions of the
//! relationship in agreement.

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::config::BindingConfig;
use crate::consts::{
    DEGENERATE_EPSILON, FIXED_BINDING_DISTANCE, INNER_SNAP_RATIO, MIN_STORED_GAP, SNAP_TO_MID_MAX_PX, SNAP_TO_MID_MIN_PX,
};
use crate::element::{
    BindableShape, BoundElement, BoundKind, EdgeEnd, Element, ElementId, ElementUpdate, FixedPoint, PointBinding,
};
use crate::error::RouteError;
use crate::geom::{Bounds, Point, rotate_point};
use crate::heading::{Heading, heading_for_point_from_element};
use crate::hit;
use crate::index::{BindingIndex, reconcile_bound_elements};
use crate::intersect::{
    determine_focus_distance, determine_focus_point, distance_to_bindable_element, intersect_element_with_line,
    max_binding_gap,
};
use crate::linear::{self, PointMove};
use crate::route::{self, RouteOptions};
use crate::scene::Scene;

/// Tolerance when picking an outline hit on the same axis as the point.
const SAME_AXIS_TOLERANCE: f64 = 0.1;

/// Offset that keeps a side-midpoint snap off the exact center line.
const MID_BIND_NUDGE: f64 = 0.1;

/// What to do with one end of an arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    /// Leave the end as it is.
    Keep,
    /// Unbind the end.
    Clear,
    /// Bind the end to this shape.
    Bind(ElementId),
}

/// Options for [`update_bound_elements`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateBoundOptions<'a> {
    /// Arrows already being moved by the same operation. Only their
    /// bindings are refreshed; their points are left to the caller.
    pub simultaneously_updated: &'a [ElementId],
    /// Width and height of the shape before a resize. `None` for moves and
    /// rotations, which keep every gap unchanged.
    pub resized_from: Option<(f64, f64)>,
}

/// Which mode [`fix_bindings_after_duplication`] runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateMode {
    /// The duplicates are the new copies.
    #[default]
    Normal,
    /// Alt-drag: the duplicates stay behind and the originals move on.
    DuplicatesServeAsOld,
}

// ── Bind / unbind ───────────────────────────────────────────────

/// Focus and gap of `end` of `el` relative to `shape`, from current geometry.
#[must_use]
pub fn calculate_focus_and_gap(el: &Element, shape: &BindableShape, end: EdgeEnd) -> (f64, f64) {
    let Some(linear) = el.as_linear() else {
        return (0.0, MIN_STORED_GAP);
    };
    let edge = linear.end_index(end).and_then(|i| linear::point_at_index_global(el, i));
    let adjacent = linear.adjacent_index(end).and_then(|i| linear::point_at_index_global(el, i));
    let Some(edge) = edge else {
        return (0.0, MIN_STORED_GAP);
    };
    let focus = adjacent.map_or(0.0, |adjacent| determine_focus_distance(shape, adjacent, edge));
    let gap = MIN_STORED_GAP.max(distance_to_bindable_element(shape, edge));
    (focus, gap)
}

/// Bind `end` of the arrow to the shape and record the back-reference.
///
/// Returns false (and changes nothing) when either element is missing or the
/// linear element is not an arrow.
pub fn bind_linear_element(scene: &mut Scene, arrow_id: &ElementId, shape_id: &ElementId, end: EdgeEnd) -> bool {
    let Some(el) = scene.get_non_deleted(arrow_id) else {
        return false;
    };
    let Some(linear) = el.as_arrow() else {
        debug!(%arrow_id, "bind skipped: not an arrow");
        return false;
    };
    let Some(shape) = scene.bindable(shape_id) else {
        return false;
    };

    let (focus, gap) = calculate_focus_and_gap(el, &shape, end);
    let fixed_point = linear.elbowed.then(|| calculate_fixed_point_for_elbow_arrow_binding(el, &shape, end));
    let binding = PointBinding { element_id: shape.id, focus, gap, fixed_point };
    scene.mutate(arrow_id, &ElementUpdate::binding(end, Some(binding)));

    if let Some(shape_el) = scene.get(shape_id) {
        if !shape_el.has_bound_arrow(*arrow_id) {
            let mut bound = shape_el.bound_elements.clone();
            bound.push(BoundElement::arrow(*arrow_id));
            scene.mutate(shape_id, &ElementUpdate::bound_elements(bound));
        }
    }
    debug!(%arrow_id, %shape_id, ?end, focus, gap, "arrow end bound");
    true
}

/// Clear the binding at `end`, returning the shape it pointed at.
///
/// The shape's back-reference is left for the caller to reconcile.
pub fn unbind_linear_element(scene: &mut Scene, arrow_id: &ElementId, end: EdgeEnd) -> Option<ElementId> {
    let shape_id = scene.get(arrow_id)?.as_linear()?.binding(end)?.element_id;
    scene.mutate(arrow_id, &ElementUpdate::binding(end, None));
    Some(shape_id)
}

/// Apply a [`BindTarget`] to each end of the arrow.
///
/// A simple arrow never binds both ends to the same shape: when both targets
/// agree only the start binds. Shapes that lose this arrow on both ends drop
/// their back-reference. Elbow arrows are routed again afterwards.
///
/// # Errors
///
/// Returns the routing failure of an elbow arrow; the bindings are updated
/// regardless.
pub fn bind_or_unbind_linear_element(
    scene: &mut Scene,
    config: &BindingConfig,
    arrow_id: &ElementId,
    start: BindTarget,
    end: BindTarget,
) -> Result<(), RouteError> {
    let mut bound_to = BTreeSet::new();
    let mut unbound_from = BTreeSet::new();
    bind_or_unbind_edge(scene, arrow_id, start, end, EdgeEnd::Start, &mut bound_to, &mut unbound_from);
    bind_or_unbind_edge(scene, arrow_id, end, start, EdgeEnd::End, &mut bound_to, &mut unbound_from);

    let touched: Vec<ElementId> = bound_to.union(&unbound_from).copied().collect();
    if !touched.is_empty() {
        reconcile_bound_elements(scene, Some(&touched));
    }

    if scene.get_non_deleted(arrow_id).is_some_and(Element::is_elbow_arrow) {
        route::reroute_elbow_arrow(scene, config, arrow_id)?;
    }
    Ok(())
}

fn bind_or_unbind_edge(
    scene: &mut Scene,
    arrow_id: &ElementId,
    target: BindTarget,
    other_target: BindTarget,
    end: EdgeEnd,
    bound_to: &mut BTreeSet<ElementId>,
    unbound_from: &mut BTreeSet<ElementId>,
) {
    let Some(linear) = scene.get_non_deleted(arrow_id).and_then(Element::as_arrow) else {
        return;
    };
    let previous = linear.binding(end).map(|b| b.element_id);
    let opposite = linear.binding(end.other()).map(|b| b.element_id);
    let simple = linear.is_simple();

    match target {
        BindTarget::Keep => {}
        BindTarget::Clear => {
            if let Some(shape_id) = unbind_linear_element(scene, arrow_id, end) {
                unbound_from.insert(shape_id);
            }
        }
        BindTarget::Bind(shape_id) => {
            let allowed = !simple
                || match other_target {
                    BindTarget::Clear => true,
                    BindTarget::Keep => opposite != Some(shape_id),
                    BindTarget::Bind(other_id) => end == EdgeEnd::Start || other_id != shape_id,
                };
            if allowed && bind_linear_element(scene, arrow_id, &shape_id, end) {
                bound_to.insert(shape_id);
                if let Some(prev) = previous.filter(|prev| *prev != shape_id) {
                    unbound_from.insert(prev);
                }
            } else if !allowed && previous == Some(shape_id) {
                debug!(%arrow_id, %shape_id, ?end, "simple arrow bound twice to one shape, clearing");
                if let Some(prev) = unbind_linear_element(scene, arrow_id, end) {
                    unbound_from.insert(prev);
                }
            }
        }
    }
}

// ── Following shape changes ─────────────────────────────────────

/// Scale a gap along with its shape, clamped to `[1, max_binding_gap]`.
#[must_use]
pub fn rescale_gap(binding: PointBinding, shape: &BindableShape, resized_from: Option<(f64, f64)>) -> PointBinding {
    let Some((old_width, old_height)) = resized_from else {
        return binding;
    };
    let ratio = if shape.width < shape.height { shape.width / old_width } else { shape.height / old_height };
    if !ratio.is_finite() {
        return binding;
    }
    let max_gap = max_binding_gap(shape.kind, shape.width, shape.height);
    PointBinding { gap: MIN_STORED_GAP.max(max_gap.min(binding.gap * ratio)), ..binding }
}

/// Local position `end` of `el` should move to so it keeps `binding` to `shape`.
///
/// Elbow arrows with a fixed point land on that point; other arrows land on
/// the outline (grown by the gap) along the line from the adjacent point
/// toward the focus point.
#[must_use]
pub fn update_bound_point(el: &Element, end: EdgeEnd, binding: &PointBinding, shape: &BindableShape) -> Option<Point> {
    let linear = el.as_linear()?;
    if linear.elbowed {
        if let Some(fixed) = binding.fixed_point {
            return Some(linear::point_from_absolute(el, global_fixed_point(fixed, shape)));
        }
    }
    let adjacent = linear::point_at_index_global(el, linear.adjacent_index(end)?)?;
    let focus_point = determine_focus_point(shape, binding.focus, adjacent);
    let edge = if binding.gap <= 0.0 {
        focus_point
    } else {
        intersect_element_with_line(shape, adjacent, focus_point, binding.gap).first().copied().unwrap_or(focus_point)
    };
    Some(linear::point_from_absolute(el, edge))
}

/// Bring every arrow bound to `changed_id` back in line with the shape.
///
/// Call after the shape's geometry has been written. Arrows listed in
/// `simultaneously_updated` only get their gaps refreshed. When both ends of
/// an arrow are bound to shapes that don't overlap, the far end is refreshed
/// too, since its adjacent point just moved.
///
/// Returns the routing failures of elbow arrows; every other arrow is still
/// updated.
pub fn update_bound_elements(
    scene: &mut Scene,
    config: &BindingConfig,
    changed_id: &ElementId,
    options: &UpdateBoundOptions<'_>,
) -> Vec<RouteError> {
    let Some(changed) = scene.bindable(changed_id) else {
        return Vec::new();
    };
    let mut errors = Vec::new();

    for arrow_id in BindingIndex::from_scene(scene).arrows_bound_to(changed_id) {
        let Some(el) = scene.get_non_deleted(&arrow_id) else {
            continue;
        };
        let Some(linear) = el.as_arrow() else {
            continue;
        };

        let mut bindings = [linear.start_binding, linear.end_binding];
        let mut other = ElementUpdate::default();
        for (end, slot) in [EdgeEnd::Start, EdgeEnd::End].into_iter().zip(bindings.iter_mut()) {
            if let Some(binding) = slot.filter(|b| b.element_id == changed.id) {
                let rescaled = rescale_gap(binding, &changed, options.resized_from);
                *slot = Some(rescaled);
                other = other.with_binding(end, Some(rescaled));
            }
        }

        if options.simultaneously_updated.contains(&arrow_id) {
            scene.mutate(&arrow_id, &other);
            continue;
        }

        let ends_apart = match (linear.start_binding, linear.end_binding) {
            (Some(start), Some(end)) => {
                match (scene.element_bounds(&start.element_id), scene.element_bounds(&end.element_id)) {
                    (Some(a), Some(b)) => !a.intersects(&b),
                    _ => false,
                }
            }
            _ => false,
        };

        let mut targets = Vec::new();
        for (end, binding) in [EdgeEnd::Start, EdgeEnd::End].into_iter().zip(bindings) {
            let Some(binding) = binding else {
                continue;
            };
            let shape = if binding.element_id == changed.id {
                changed
            } else if ends_apart {
                let Some(shape) = scene.bindable(&binding.element_id) else {
                    continue;
                };
                shape
            } else {
                continue;
            };
            if let (Some(index), Some(point)) = (linear.end_index(end), update_bound_point(el, end, &binding, &shape)) {
                targets.push(PointMove { index, point });
            }
        }

        if let Err(err) = linear::move_points(scene, config, &arrow_id, &targets, other, RouteOptions::default()) {
            warn!(%arrow_id, shape_id = %changed.id, code = err.error_code(), "bound arrow not updated: {err}");
            errors.push(err);
        }
    }
    errors
}

// ── Elbow-arrow snapping ────────────────────────────────────────

fn ratio(offset: f64, size: f64) -> f64 {
    if size.abs() < DEGENERATE_EPSILON { 0.5 } else { offset / size }
}

/// Fixed point for `end` of an elbow arrow, from where it would snap on
/// `shape`'s outline.
#[must_use]
pub fn calculate_fixed_point_for_elbow_arrow_binding(el: &Element, shape: &BindableShape, end: EdgeEnd) -> FixedPoint {
    let points = el.as_linear().map(|linear| {
        let at = |e: EdgeEnd| linear.end_index(e).and_then(|i| linear::point_at_index_global(el, i));
        (at(end), at(end.other()))
    });
    let Some((Some(global), Some(other))) = points else {
        return FixedPoint::new(0.5, 0.5).normalize();
    };
    let snapped = bind_point_to_snap_to_element_outline(global, other, shape);
    let unrotated = rotate_point(snapped, shape.center(), -shape.angle);
    FixedPoint::new(ratio(unrotated.x - shape.x, shape.width), ratio(unrotated.y - shape.y, shape.height)).normalize()
}

/// World position of a fixed point on `shape`.
#[must_use]
pub fn global_fixed_point(fixed: FixedPoint, shape: &BindableShape) -> Point {
    let fixed = fixed.normalize();
    rotate_point(
        Point::new(shape.x + shape.width * fixed.x, shape.y + shape.height * fixed.y),
        shape.center(),
        shape.angle,
    )
}

/// Move a point that sits diagonally off a corner of a rectangular shape onto
/// one of the two sides meeting there, `FIXED_BINDING_DISTANCE` out.
#[must_use]
pub fn avoid_rectangular_corner(shape: &BindableShape, p: Point) -> Point {
    let center = shape.center();
    let local = rotate_point(p, center, -shape.angle);
    let (left, top) = (shape.x, shape.y);
    let (right, bottom) = (shape.x + shape.width, shape.y + shape.height);
    let back = |q: Point| rotate_point(q, center, shape.angle);

    if local.x < left && local.y < top {
        if local.y - top > -FIXED_BINDING_DISTANCE {
            return back(Point::new(left - FIXED_BINDING_DISTANCE, top));
        }
        return back(Point::new(left, top - FIXED_BINDING_DISTANCE));
    } else if local.x < left && local.y > bottom {
        if local.x - left > -FIXED_BINDING_DISTANCE {
            return back(Point::new(left, bottom + FIXED_BINDING_DISTANCE));
        }
        return back(Point::new(left - FIXED_BINDING_DISTANCE, bottom));
    } else if local.x > right && local.y > bottom {
        if local.x - left < shape.width + FIXED_BINDING_DISTANCE {
            return back(Point::new(right, bottom + FIXED_BINDING_DISTANCE));
        }
        return back(Point::new(right + FIXED_BINDING_DISTANCE, bottom));
    } else if local.x > right && local.y < top {
        if local.x - left < shape.width + FIXED_BINDING_DISTANCE {
            return back(Point::new(right, top - FIXED_BINDING_DISTANCE));
        }
        return back(Point::new(right + FIXED_BINDING_DISTANCE, top));
    }
    p
}

/// Pull `p` onto the nearest side midpoint (just outside the outline) when
/// it is within `tolerance` of that side's center line.
///
/// The threshold is a fraction of the shape's size, clamped to 5..=80 px.
#[must_use]
pub fn snap_to_mid(shape: &BindableShape, p: Point, tolerance: f64) -> Point {
    let BindableShape { x, y, width, height, angle, .. } = *shape;
    let center = Point::new(x + width / 2.0 - MID_BIND_NUDGE, y + height / 2.0 - MID_BIND_NUDGE);
    let local = rotate_point(p, center, -angle);
    let vertical = (tolerance * height).clamp(SNAP_TO_MID_MIN_PX, SNAP_TO_MID_MAX_PX);
    let horizontal = (tolerance * width).clamp(SNAP_TO_MID_MIN_PX, SNAP_TO_MID_MAX_PX);
    let near_row = local.y > center.y - vertical && local.y < center.y + vertical;
    let near_column = local.x > center.x - horizontal && local.x < center.x + horizontal;

    let snapped = if local.x <= x + width / 2.0 && near_row {
        Point::new(x - FIXED_BINDING_DISTANCE, center.y)
    } else if local.y <= y + height / 2.0 && near_column {
        Point::new(center.x, y - FIXED_BINDING_DISTANCE)
    } else if local.x >= x + width / 2.0 && near_row {
        Point::new(x + width + FIXED_BINDING_DISTANCE, center.y)
    } else if local.y >= y + height / 2.0 && near_column {
        Point::new(center.x, y + height + FIXED_BINDING_DISTANCE)
    } else {
        return p;
    };
    rotate_point(snapped, center, angle)
}

/// Midpoint of the side of `aabb` that faces `p`.
#[must_use]
pub fn heading_to_mid_bind_point(p: Point, shape: &BindableShape, aabb: Bounds) -> Point {
    let center = aabb.center();
    let mid_x = f64::midpoint(aabb.min_x, aabb.max_x);
    let mid_y = f64::midpoint(aabb.min_y, aabb.max_y);
    let side = match Heading::between(center, p) {
        Heading::Up => Point::new(mid_x + MID_BIND_NUDGE, aabb.min_y),
        Heading::Right => Point::new(aabb.max_x, mid_y + MID_BIND_NUDGE),
        Heading::Down => Point::new(mid_x - MID_BIND_NUDGE, aabb.max_y),
        Heading::Left => Point::new(aabb.min_x, mid_y - MID_BIND_NUDGE),
    };
    rotate_point(side, center, shape.angle)
}

/// Snap `p` onto the shape's outline, `FIXED_BINDING_DISTANCE` out, along
/// the axis perpendicular to the side it is nearest to.
///
/// A point deep inside the shape goes to the side midpoint facing `other`.
/// When no outline hit lies on the same axis, `p` is returned unchanged.
#[must_use]
pub fn bind_point_to_snap_to_element_outline(p: Point, other: Point, shape: &BindableShape) -> Point {
    let aabb = shape.aabb();
    let heading = heading_for_point_from_element(shape, aabb, p);
    let across_side = heading.is_horizontal();

    let distance = distance_to_bindable_element(shape, p);
    let depth_limit = if across_side { shape.width } else { shape.height } * -INNER_SNAP_RATIO;
    if distance < depth_limit {
        return heading_to_mid_bind_point(other, shape, aabb);
    }

    let mut hits = intersect_element_with_line(
        shape,
        Point::new(p.x, p.y - 2.0 * shape.height),
        Point::new(p.x, p.y + 2.0 * shape.height),
        FIXED_BINDING_DISTANCE,
    );
    hits.extend(intersect_element_with_line(
        shape,
        Point::new(p.x - 2.0 * shape.width, p.y),
        Point::new(p.x + 2.0 * shape.width, p.y),
        FIXED_BINDING_DISTANCE,
    ));
    hits.sort_by(|a, b| a.distance_sq(p).total_cmp(&b.distance_sq(p)));
    hits.into_iter()
        .find(|hit| {
            if across_side {
                (p.y - hit.y).abs() < SAME_AXIS_TOLERANCE
            } else {
                (p.x - hit.x).abs() < SAME_AXIS_TOLERANCE
            }
        })
        .unwrap_or(p)
}

/// Corner avoidance (for rectangular shapes) followed by outline snapping.
#[must_use]
pub fn snap_point(p: Point, other: Point, shape: &BindableShape) -> Point {
    let p = if shape.kind.is_rectangular() { avoid_rectangular_corner(shape, p) } else { p };
    bind_point_to_snap_to_element_outline(p, other, shape)
}

/// Heading an elbow end leaves `shape` along.
///
/// Without a shape the end simply points at `other`. When `orig` is on the
/// outline or outside binding range the heading points away from the
/// shape's center; otherwise the search cones decide.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn heading_for_elbow_arrow_snap(
    p: Point,
    other: Point,
    shape: Option<&BindableShape>,
    aabb: Option<Bounds>,
    orig: Point,
) -> Heading {
    let (Some(shape), Some(aabb)) = (shape, aabb) else {
        return Heading::between(p, other);
    };
    let distance = distance_to_bindable_element(shape, orig);
    let in_range = distance <= max_binding_gap(shape.kind, shape.width, shape.height);
    if !in_range || distance == 0.0 {
        return Heading::between(shape.center(), p);
    }
    heading_for_point_from_element(shape, aabb, p)
}

// ── Structural edits ────────────────────────────────────────────

/// Repair bindings after `deleted` elements were tombstoned.
///
/// Arrows bound to a deleted shape lose that binding, the shape loses its
/// arrow back-references, and shapes bound by a deleted arrow stop listing it.
pub fn fix_bindings_after_deletion(scene: &mut Scene, deleted: &[ElementId]) {
    let deleted_set: BTreeSet<ElementId> = deleted.iter().copied().collect();
    for id in &deleted_set {
        let Some(el) = scene.get(id) else {
            continue;
        };
        if el.as_bindable().is_some() {
            let keep: Vec<BoundElement> =
                el.bound_elements.iter().filter(|b| b.kind != BoundKind::Arrow).copied().collect();
            let had_arrows = keep.len() != el.bound_elements.len();

            for arrow_id in scene.arrow_ids() {
                let Some(linear) = scene.get(&arrow_id).and_then(Element::as_linear) else {
                    continue;
                };
                let ends = linear.ends_bound_to(*id);
                if ends.is_empty() {
                    continue;
                }
                let update = ends.iter().fold(ElementUpdate::default(), |u, end| u.with_binding(*end, None));
                scene.mutate(&arrow_id, &update);
                debug!(%arrow_id, shape_id = %id, "binding to deleted shape cleared");
            }
            if had_arrows {
                scene.mutate(id, &ElementUpdate::bound_elements(keep));
            }
        } else if let Some(linear) = el.as_arrow() {
            let shapes: BTreeSet<ElementId> = [linear.start_binding, linear.end_binding]
                .into_iter()
                .flatten()
                .map(|b| b.element_id)
                .filter(|shape_id| !deleted_set.contains(shape_id))
                .collect();
            for shape_id in shapes {
                let Some(shape) = scene.get(&shape_id) else {
                    continue;
                };
                if shape.has_bound_arrow(*id) {
                    let keep = shape
                        .bound_elements
                        .iter()
                        .filter(|b| !(b.kind == BoundKind::Arrow && b.id == *id))
                        .copied()
                        .collect();
                    scene.mutate(&shape_id, &ElementUpdate::bound_elements(keep));
                }
            }
        }
    }
}

fn remap_binding(binding: Option<PointBinding>, id_map: &HashMap<ElementId, ElementId>) -> Option<PointBinding> {
    binding.map(|b| PointBinding { element_id: id_map.get(&b.element_id).copied().unwrap_or(b.element_id), ..b })
}

/// Point bindings and back-references of freshly duplicated elements at the
/// right copies.
///
/// `old_ids` are the elements that were duplicated and `id_map` maps each to
/// its copy; both the originals and the copies must already be in the scene.
/// References between two duplicated elements are remapped to the copies;
/// references to elements outside the duplicated set are kept. In
/// [`DuplicateMode::DuplicatesServeAsOld`] the roles flip: arrows outside the
/// set that were bound to a duplicated shape follow the copy. Back-references
/// are reconciled afterwards so both directions agree.
pub fn fix_bindings_after_duplication(
    scene: &mut Scene,
    old_ids: &[ElementId],
    id_map: &HashMap<ElementId, ElementId>,
    mode: DuplicateMode,
) {
    let reverse_roles = mode == DuplicateMode::DuplicatesServeAsOld;
    let copy_to_original: HashMap<ElementId, ElementId> = id_map.iter().map(|(old, new)| (*new, *old)).collect();
    let mut arrows_to_remap: BTreeSet<ElementId> = BTreeSet::new();
    let mut shapes_to_remap: BTreeSet<ElementId> = BTreeSet::new();

    for old_id in old_ids {
        let Some(old) = scene.get(old_id) else {
            continue;
        };
        if !old.bound_elements.is_empty() {
            if reverse_roles {
                arrows_to_remap.extend(old.bound_elements.iter().map(|b| b.id).filter(|id| !id_map.contains_key(id)));
            }
            if let Some(copy) = id_map.get(old_id) {
                shapes_to_remap.insert(*copy);
            }
        }
        if let Some(linear) = old.as_arrow() {
            let bound: Vec<ElementId> =
                [linear.start_binding, linear.end_binding].into_iter().flatten().map(|b| b.element_id).collect();
            if reverse_roles {
                shapes_to_remap.extend(bound.iter().filter(|id| !id_map.contains_key(id)));
            }
            if !bound.is_empty() {
                if let Some(copy) = id_map.get(old_id) {
                    arrows_to_remap.insert(*copy);
                }
            }
        }
    }

    for arrow_id in &arrows_to_remap {
        let Some(linear) = scene.get(arrow_id).and_then(Element::as_linear) else {
            continue;
        };
        let update = ElementUpdate {
            start_binding: Some(remap_binding(linear.start_binding, id_map)),
            end_binding: Some(remap_binding(linear.end_binding, id_map)),
            ..ElementUpdate::default()
        };
        scene.mutate(arrow_id, &update);
    }

    for shape_id in &shapes_to_remap {
        let Some(original) = copy_to_original.get(shape_id).and_then(|old| scene.get(old)) else {
            continue;
        };
        if original.bound_elements.is_empty() {
            continue;
        }
        let remapped: Vec<BoundElement> = original
            .bound_elements
            .iter()
            .map(|b| BoundElement { id: id_map.get(&b.id).copied().unwrap_or(b.id), kind: b.kind })
            .collect();
        scene.mutate(shape_id, &ElementUpdate::bound_elements(remapped));
    }

    let repaired = reconcile_bound_elements(scene, None);
    debug!(
        arrows = arrows_to_remap.len(),
        shapes = shapes_to_remap.len(),
        repaired,
        ?mode,
        "bindings remapped after duplication"
    );
}

// ── Binding on release ──────────────────────────────────────────

fn eligible_target(scene: &Scene, arrow_id: &ElementId, end: EdgeEnd, binding_enabled: bool) -> BindTarget {
    if !binding_enabled {
        return BindTarget::Clear;
    }
    hit::eligible_element_for_binding(scene, arrow_id, end).map_or(BindTarget::Clear, |shape| BindTarget::Bind(shape.id))
}

/// Decide each end's [`BindTarget`] once a drag of the arrow ends.
///
/// With `dragged_points`, only the dragged ends look for a new shape and
/// untouched ends refresh their current binding. Without, the whole arrow
/// (or an interior point) moved: each end rebinds only while it is still
/// within the binding border of its original shape.
#[must_use]
pub fn binding_strategy(
    scene: &Scene,
    arrow_id: &ElementId,
    binding_enabled: bool,
    dragged_points: Option<&[usize]>,
) -> [BindTarget; 2] {
    let Some(linear) = scene.get_non_deleted(arrow_id).and_then(Element::as_arrow) else {
        return [BindTarget::Keep, BindTarget::Keep];
    };
    match dragged_points.filter(|points| !points.is_empty()) {
        Some(points) => [EdgeEnd::Start, EdgeEnd::End].map(|end| {
            let dragged = linear.end_index(end).is_some_and(|index| points.contains(&index));
            if dragged {
                eligible_target(scene, arrow_id, end, binding_enabled)
            } else {
                linear
                    .binding(end)
                    .filter(|b| scene.bindable(&b.element_id).is_some())
                    .map_or(BindTarget::Keep, |b| BindTarget::Bind(b.element_id))
            }
        }),
        None => {
            let still_close = hit::original_bindings_if_still_close(scene, arrow_id);
            let mut targets = [BindTarget::Clear, BindTarget::Clear];
            for ((slot, end), close) in targets.iter_mut().zip([EdgeEnd::Start, EdgeEnd::End]).zip(still_close) {
                if close.is_some() {
                    *slot = eligible_target(scene, arrow_id, end, binding_enabled);
                }
            }
            targets
        }
    }
}

/// Bind or unbind every selected arrow after a drag ends.
///
/// Returns routing failures of elbow arrows.
pub fn bind_or_unbind_linear_elements(
    scene: &mut Scene,
    config: &BindingConfig,
    selected: &[ElementId],
    binding_enabled: bool,
    dragged_points: Option<&[usize]>,
) -> Vec<RouteError> {
    let mut errors = Vec::new();
    for arrow_id in selected {
        if !scene.get_non_deleted(arrow_id).is_some_and(Element::is_arrow) {
            continue;
        }
        let [start, end] = binding_strategy(scene, arrow_id, binding_enabled, dragged_points);
        if let Err(err) = bind_or_unbind_linear_element(scene, config, arrow_id, start, end) {
            warn!(%arrow_id, code = err.error_code(), "rebinding left elbow arrow unrouted: {err}");
            errors.push(err);
        }
    }
    errors
}

/// Bind a freshly drawn arrow: the start to the shape it was started on, the
/// end to whatever shape is under `pointer`.
///
/// # Errors
///
/// Returns the routing failure of an elbow arrow.
pub fn maybe_bind_linear_element(
    scene: &mut Scene,
    config: &BindingConfig,
    arrow_id: &ElementId,
    start_shape: Option<ElementId>,
    pointer: Point,
) -> Result<(), RouteError> {
    let Some(linear) = scene.get_non_deleted(arrow_id).and_then(Element::as_arrow) else {
        return Ok(());
    };
    let elbowed = linear.elbowed;
    let mut touched: Vec<ElementId> =
        [linear.start_binding, linear.end_binding].into_iter().flatten().map(|b| b.element_id).collect();

    if let Some(shape_id) = start_shape {
        if bind_linear_element(scene, arrow_id, &shape_id, EdgeEnd::Start) {
            touched.push(shape_id);
        }
    }
    if let Some(hovered) = hit::hovered_element_for_binding(scene, pointer, elbowed) {
        let blocked = scene.get(arrow_id).and_then(Element::as_linear).is_some_and(|linear| {
            linear.is_simple() && linear.start_binding.is_some_and(|b| b.element_id == hovered.id)
        });
        if !blocked && bind_linear_element(scene, arrow_id, &hovered.id, EdgeEnd::End) {
            touched.push(hovered.id);
        }
    }

    if !touched.is_empty() {
        reconcile_bound_elements(scene, Some(&touched));
    }
    if elbowed {
        route::reroute_elbow_arrow(scene, config, arrow_id)?;
    }
    Ok(())
}
