//! Orthogonal router for elbow arrows.
//!
//! Routing happens in three steps:
//!
//! 1. Each end gets a padded box around its shape (or a tiny box around a
//!    free point). The two boxes are split so they never overlap.
//! 2. The box edges, plus the lines through each end's exit point
//!    ("dongle"), form a sparse grid of candidate corners.
//! 3. A* over the grid finds a path that never reverses, never crosses a
//!    box interior, and pays a steep cost for every bend.
//!
//! The result is simplified to its corners and written back to the arrow
//! as local points, with the first point at the origin and no rotation.

#[cfg(test)]
#[path = "route_test.rs"]
mod route_test;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, warn};

use crate::binding::{global_fixed_point, heading_for_elbow_arrow_snap, snap_point, snap_to_mid};
use crate::config::BindingConfig;
use crate::consts::{BASE_PADDING, FIXED_BINDING_DISTANCE, FIXED_POINT_OUTLINE_TOLERANCE, POINT_BOX_HALF_SIZE};
use crate::element::{BindableShape, ElementId, ElementUpdate, FixedPoint};
use crate::error::RouteError;
use crate::geom::{Bounds, Offsets, Point, Vector};
use crate::heading::Heading;
use crate::hit;
use crate::intersect::distance_to_bindable_element;
use crate::scene::Scene;

/// Slack when comparing summed box widths against their union.
const SIDE_SPLIT_EPSILON: f64 = 1e-11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOptions {
    /// An endpoint is being dragged: bind to whatever shape is under it
    /// instead of the stored bindings.
    pub dragging: bool,
}

/// One end of a route request, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEnd {
    pub point: Point,
    pub heading: Heading,
    /// Unpadded box of the shape this end attaches to.
    pub shape: Option<Bounds>,
    pub arrowhead: bool,
    /// The route may not step onto this end's grid node.
    pub closed: bool,
}

impl RouteEnd {
    /// A free end with no shape and no arrowhead.
    #[must_use]
    pub fn free(point: Point, heading: Heading) -> Self {
        Self { point, heading, shape: None, arrowhead: false, closed: false }
    }

    fn head_length(&self) -> f64 {
        if self.arrowhead { FIXED_BINDING_DISTANCE * 6.0 } else { FIXED_BINDING_DISTANCE * 2.0 }
    }

    fn point_bounds(&self) -> Bounds {
        Bounds::around(self.point, POINT_BOX_HALF_SIZE)
    }

    fn element_bounds(&self) -> Bounds {
        match self.shape {
            Some(shape) => shape.inflate(offset_from_heading(self.heading, self.head_length(), 1.0)),
            None => self.point_bounds(),
        }
    }

    fn overlap_bounds(&self) -> Bounds {
        match self.shape {
            Some(shape) => shape.inflate(offset_from_heading(self.heading, BASE_PADDING, BASE_PADDING)),
            None => self.point_bounds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub start: RouteEnd,
    pub end: RouteEnd,
}

// ── Entry points ────────────────────────────────────────────────

/// Re-route an elbow arrow and store the result.
///
/// `next_points` are the requested local points after the caller's edit and
/// `offset` the shift of the element origin that came with it. Only the two
/// endpoints matter; the interior is recomputed. Fields in `other` (usually
/// refreshed bindings) override the arrow's own before routing and are
/// written together with the new points.
///
/// # Errors
///
/// Fails when the element is not a live elbow arrow, has fewer than two
/// points, or no route exists. On an unreachable route the previous points
/// stay in place but the non-point fields of `other` are still applied.
pub fn mutate_elbow_arrow(
    scene: &mut Scene,
    config: &BindingConfig,
    id: &ElementId,
    next_points: Vec<Point>,
    offset: Vector,
    other: ElementUpdate,
    options: RouteOptions,
) -> Result<(), RouteError> {
    let arrow_id = *id;
    let Some(el) = scene.get_non_deleted(id) else {
        return Err(RouteError::NotFound(arrow_id));
    };
    let Some(arrow) = el.as_arrow().filter(|a| a.elbowed) else {
        return Err(RouteError::NotElbowArrow(arrow_id));
    };
    let (Some(first), Some(last)) = (next_points.first(), next_points.last()) else {
        return Err(RouteError::TooFewPoints { arrow_id, count: next_points.len() });
    };
    if next_points.len() < 2 {
        return Err(RouteError::TooFewPoints { arrow_id, count: next_points.len() });
    }

    let start_binding = other.start_binding.unwrap_or(arrow.start_binding);
    let end_binding = other.end_binding.unwrap_or(arrow.end_binding);

    let origin = Vector::new(el.x + offset.x, el.y + offset.y);
    let orig_start = *first + origin;
    let orig_end = *last + origin;

    let start_element = start_binding.and_then(|b| scene.bindable(&b.element_id));
    let end_element = end_binding.and_then(|b| scene.bindable(&b.element_id));

    let (hovered_start, hovered_end) = if options.dragging {
        (
            hit::hovered_element_for_binding(scene, orig_start, true),
            hit::hovered_element_for_binding(scene, orig_end, true),
        )
    } else {
        (start_element, end_element)
    };

    let start_point = global_point(
        config,
        start_binding.and_then(|b| b.fixed_point),
        orig_start,
        orig_end,
        start_element,
        hovered_start,
        options.dragging,
    );
    let end_point = global_point(
        config,
        end_binding.and_then(|b| b.fixed_point),
        orig_end,
        orig_start,
        end_element,
        hovered_end,
        options.dragging,
    );
    let start_heading = bind_point_heading(start_point, end_point, hovered_start.as_ref(), orig_start);
    let end_heading = bind_point_heading(end_point, start_point, hovered_end.as_ref(), orig_end);

    let request = RouteRequest {
        start: RouteEnd {
            point: start_point,
            heading: start_heading,
            shape: hovered_start.map(|s| s.aabb()),
            arrowhead: arrow.start_arrowhead.is_some(),
            closed: start_binding.is_some(),
        },
        end: RouteEnd {
            point: end_point,
            heading: end_heading,
            shape: hovered_end.map(|s| s.aabb()),
            arrowhead: arrow.end_arrowhead.is_some(),
            closed: hovered_end.is_some(),
        },
    };

    let Some(points) = route_elbow(&request) else {
        warn!(%arrow_id, ?start_heading, ?end_heading, "elbow route: no path found, keeping previous points");
        let rest = ElementUpdate { points: None, ..other };
        if !rest.is_empty() {
            scene.mutate(id, &rest);
        }
        return Err(RouteError::Unreachable { arrow_id });
    };

    debug!(%arrow_id, corners = points.len(), "elbow route: updated");
    scene.mutate(id, &normalized_update(&points, other));
    Ok(())
}

/// Route an elbow arrow again from its current endpoints and bindings.
///
/// # Errors
///
/// Same as [`mutate_elbow_arrow`].
pub fn reroute_elbow_arrow(scene: &mut Scene, config: &BindingConfig, id: &ElementId) -> Result<(), RouteError> {
    let Some(points) = scene.get_non_deleted(id).and_then(|el| el.as_linear()).map(|l| l.points.clone()) else {
        return Err(RouteError::NotFound(*id));
    };
    mutate_elbow_arrow(scene, config, id, points, Vector::default(), ElementUpdate::default(), RouteOptions::default())
}

/// Compute the corner points of a route in world space, or `None` when the
/// grid offers no path.
#[must_use]
pub fn route_elbow(request: &RouteRequest) -> Option<Vec<Point>> {
    let RouteRequest { start, end } = *request;

    let bounds_overlap =
        end.overlap_bounds().contains_strict(start.point) || start.overlap_bounds().contains_strict(end.point);
    let none_hovered = start.shape.is_none() && end.shape.is_none();

    let (start_box, end_box) = if bounds_overlap {
        (start.point_bounds(), end.point_bounds())
    } else {
        (start.element_bounds(), end.element_bounds())
    };
    let common = start_box.union(end_box);

    let padding = |route_end: &RouteEnd| {
        if none_hovered {
            0.0
        } else if bounds_overlap {
            BASE_PADDING
        } else {
            BASE_PADDING - route_end.head_length()
        }
    };
    let side = if bounds_overlap { 0.0 } else { BASE_PADDING };
    let start_offsets = offset_from_heading(start.heading, padding(&start), side);
    let end_offsets = offset_from_heading(end.heading, padding(&end), side);

    let boxes = generate_dynamic_aabbs(
        start_box,
        end_box,
        common,
        start_offsets,
        end_offsets,
        bounds_overlap,
        start.shape,
        end.shape,
    );

    let start_dongle = dongle_position(boxes[0], start.heading, start.point);
    let end_dongle = dongle_position(boxes[1], end.heading, end.point);

    let mut grid = calculate_grid(&boxes, start_dongle, start.heading, end_dongle, end.heading, common);
    let start_node = grid.node_at(start_dongle)?;
    let end_node = grid.node_at(end_dongle)?;

    if end.closed {
        if let Some(node) = grid.node_at(end.point) {
            grid.close(node);
        }
    }
    if start.closed {
        if let Some(node) = grid.node_at(start.point) {
            grid.close(node);
        }
    }

    let dongles_overlap = boxes[1].contains_strict(start_dongle) || boxes[0].contains_strict(end_dongle);
    let obstacles: &[Bounds] = if dongles_overlap { &[] } else { &boxes };

    let path = astar(&mut grid, start_node, end_node, start.heading, end.heading, obstacles)?;

    let mut points = Vec::with_capacity(path.len() + 2);
    points.push(start.point);
    points.extend(path);
    points.push(end.point);
    Some(simplify_elbow_arrow_points(&points))
}

// ── Endpoint resolution ─────────────────────────────────────────

/// World position an elbow end should occupy.
fn global_point(
    config: &BindingConfig,
    fixed_point: Option<FixedPoint>,
    initial: Point,
    other: Point,
    bound: Option<BindableShape>,
    hovered: Option<BindableShape>,
    dragging: bool,
) -> Point {
    if dragging {
        return match hovered {
            Some(shape) => snap_to_mid(&shape, snap_point(initial, other, &shape), config.snap_to_mid_tolerance),
            None => initial,
        };
    }
    let Some(shape) = bound else {
        return initial;
    };
    let fixed = global_fixed_point(fixed_point.unwrap_or(FixedPoint::new(0.0, 0.0)), &shape);
    // a resize scales the fixed point along with the shape
    let drift = (distance_to_bindable_element(&shape, fixed) - FIXED_BINDING_DISTANCE).abs();
    if drift > FIXED_POINT_OUTLINE_TOLERANCE { snap_point(initial, other, &shape) } else { fixed }
}

/// Exit heading of an elbow end, judged against the shape it is near.
fn bind_point_heading(p: Point, other: Point, hovered: Option<&BindableShape>, orig: Point) -> Heading {
    let aabb = hovered.map(|shape| shape.aabb().inflate(Offsets::uniform(distance_to_bindable_element(shape, p))));
    heading_for_elbow_arrow_snap(p, other, hovered, aabb, orig)
}

fn normalized_update(points: &[Point], other: ElementUpdate) -> ElementUpdate {
    let origin = points.first().copied().unwrap_or_default();
    ElementUpdate {
        x: Some(origin.x),
        y: Some(origin.y),
        angle: Some(0.0),
        points: Some(points.iter().map(|p| Point::new(p.x - origin.x, p.y - origin.y)).collect()),
        ..other
    }
}

// ── Boxes ───────────────────────────────────────────────────────

/// Offsets that grow a box by `head` on the heading's side and `side`
/// everywhere else.
#[must_use]
pub fn offset_from_heading(heading: Heading, head: f64, side: f64) -> Offsets {
    match heading {
        Heading::Up => Offsets::new(head, side, side, side),
        Heading::Right => Offsets::new(side, head, side, side),
        Heading::Down => Offsets::new(side, side, head, side),
        Heading::Left => Offsets::new(side, side, side, head),
    }
}

/// Grow the start box `a` and end box `b` by their offsets and split the
/// space between them so they never overlap.
///
/// Where the boxes face each other the boundary is the midpoint between the
/// two shapes. When the boxes sit diagonally and still overlap, one of them
/// is cut along the axis that faces the other's center, unless
/// `disable_side_split` is set.
#[allow(clippy::too_many_arguments, clippy::similar_names)]
#[must_use]
pub fn generate_dynamic_aabbs(
    a: Bounds,
    b: Bounds,
    common: Bounds,
    start_diff: Offsets,
    end_diff: Offsets,
    disable_side_split: bool,
    start_element: Option<Bounds>,
    end_element: Option<Bounds>,
) -> [Bounds; 2] {
    let se = start_element.unwrap_or(a);
    let ee = end_element.unwrap_or(b);
    let a_apart_y = a.min_y > b.max_y || a.max_y < b.min_y;
    let a_apart_x = a.min_x > b.max_x || a.max_x < b.min_x;
    let b_apart_y = b.min_y > a.max_y || b.max_y < a.min_y;
    let b_apart_x = b.min_x > a.max_x || b.max_x < a.min_x;

    let first = Bounds::new(
        if a.min_x > b.max_x {
            let mid = f64::midpoint(se.min_x, ee.max_x);
            if a_apart_y { mid.min(a.min_x - start_diff.left) } else { mid }
        } else if a.min_x > b.min_x {
            a.min_x - start_diff.left
        } else {
            common.min_x - start_diff.left
        },
        if a.min_y > b.max_y {
            let mid = f64::midpoint(se.min_y, ee.max_y);
            if a_apart_x { mid.min(a.min_y - start_diff.top) } else { mid }
        } else if a.min_y > b.min_y {
            a.min_y - start_diff.top
        } else {
            common.min_y - start_diff.top
        },
        if a.max_x < b.min_x {
            let mid = f64::midpoint(se.max_x, ee.min_x);
            if a_apart_y { mid.max(a.max_x + start_diff.right) } else { mid }
        } else if a.max_x < b.max_x {
            a.max_x + start_diff.right
        } else {
            common.max_x + start_diff.right
        },
        if a.max_y < b.min_y {
            let mid = f64::midpoint(se.max_y, ee.min_y);
            if a_apart_x { mid.max(a.max_y + start_diff.bottom) } else { mid }
        } else if a.max_y < b.max_y {
            a.max_y + start_diff.bottom
        } else {
            common.max_y + start_diff.bottom
        },
    );

    let second = Bounds::new(
        if b.min_x > a.max_x {
            let mid = f64::midpoint(ee.min_x, se.max_x);
            if b_apart_y { mid.min(b.min_x - end_diff.left) } else { mid }
        } else if b.min_x > a.min_x {
            b.min_x - end_diff.left
        } else {
            common.min_x - end_diff.left
        },
        if b.min_y > a.max_y {
            let mid = f64::midpoint(ee.min_y, se.max_y);
            if b_apart_x { mid.min(b.min_y - end_diff.top) } else { mid }
        } else if b.min_y > a.min_y {
            b.min_y - end_diff.top
        } else {
            common.min_y - end_diff.top
        },
        if b.max_x < a.min_x {
            let mid = f64::midpoint(ee.max_x, se.min_x);
            if b_apart_y { mid.max(b.max_x + end_diff.right) } else { mid }
        } else if b.max_x < a.max_x {
            b.max_x + end_diff.right
        } else {
            common.max_x + end_diff.right
        },
        if b.max_y < a.min_y {
            let mid = f64::midpoint(ee.max_y, se.min_y);
            if b_apart_x { mid.max(b.max_y + end_diff.bottom) } else { mid }
        } else if b.max_y < a.max_y {
            b.max_y + end_diff.bottom
        } else {
            common.max_y + end_diff.bottom
        },
    );

    let c = first.union(second);
    let overlaps_x = first.width() + second.width() > c.width() + SIDE_SPLIT_EPSILON;
    let overlaps_y = first.height() + second.height() > c.height() + SIDE_SPLIT_EPSILON;
    if disable_side_split || !overlaps_x || !overlaps_y {
        return [first, second];
    }

    let end_center = second.center();
    let faces = |from: Point, to: Point| {
        let diagonal = to - from;
        let toward_end = end_center - from;
        diagonal.cross(toward_end) > 0.0
    };
    let anti_diagonal = faces(Point::new(a.max_x, a.min_y), Point::new(a.min_x, a.max_y));
    let main_diagonal = faces(Point::new(a.min_x, a.min_y), Point::new(a.max_x, a.max_y));

    if b.min_x > a.max_x && a.min_y > b.max_y {
        // end is up and to the right
        let cx = first.max_x + (second.min_x - first.max_x) / 2.0;
        let cy = second.max_y + (first.min_y - second.max_y) / 2.0;
        if anti_diagonal {
            return [
                Bounds::new(first.min_x, first.min_y, cx, first.max_y),
                Bounds::new(cx, second.min_y, second.max_x, second.max_y),
            ];
        }
        return [
            Bounds::new(first.min_x, cy, first.max_x, first.max_y),
            Bounds::new(second.min_x, second.min_y, second.max_x, cy),
        ];
    } else if a.max_x < b.min_x && a.max_y < b.min_y {
        // end is down and to the right
        let cx = first.max_x + (second.min_x - first.max_x) / 2.0;
        let cy = first.max_y + (second.min_y - first.max_y) / 2.0;
        if main_diagonal {
            return [
                Bounds::new(first.min_x, first.min_y, first.max_x, cy),
                Bounds::new(second.min_x, cy, second.max_x, second.max_y),
            ];
        }
        return [
            Bounds::new(first.min_x, first.min_y, cx, first.max_y),
            Bounds::new(cx, second.min_y, second.max_x, second.max_y),
        ];
    } else if a.min_x > b.max_x && a.max_y < b.min_y {
        // end is down and to the left
        let cx = second.max_x + (first.min_x - second.max_x) / 2.0;
        let cy = first.max_y + (second.min_y - first.max_y) / 2.0;
        if anti_diagonal {
            return [
                Bounds::new(cx, first.min_y, first.max_x, first.max_y),
                Bounds::new(second.min_x, second.min_y, cx, second.max_y),
            ];
        }
        return [
            Bounds::new(first.min_x, first.min_y, first.max_x, cy),
            Bounds::new(second.min_x, cy, second.max_x, second.max_y),
        ];
    } else if a.min_x > b.max_x && a.min_y > b.max_y {
        // end is up and to the left
        let cx = second.max_x + (first.min_x - second.max_x) / 2.0;
        let cy = second.max_y + (first.min_y - second.max_y) / 2.0;
        if main_diagonal {
            return [
                Bounds::new(cx, first.min_y, first.max_x, first.max_y),
                Bounds::new(second.min_x, second.min_y, cx, second.max_y),
            ];
        }
        return [
            Bounds::new(first.min_x, cy, first.max_x, first.max_y),
            Bounds::new(second.min_x, second.min_y, second.max_x, cy),
        ];
    }

    [first, second]
}

/// Where a route leaves `aabb` when heading out from `p`.
#[must_use]
pub fn dongle_position(aabb: Bounds, heading: Heading, p: Point) -> Point {
    match heading {
        Heading::Up => Point::new(p.x, aabb.min_y),
        Heading::Right => Point::new(aabb.max_x, p.y),
        Heading::Down => Point::new(p.x, aabb.max_y),
        Heading::Left => Point::new(aabb.min_x, p.y),
    }
}

// ── Grid ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub pos: Point,
    pub col: usize,
    pub row: usize,
    f: f64,
    g: f64,
    closed: bool,
    visited: bool,
    parent: Option<usize>,
}

/// Row-major lattice of candidate corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    nodes: Vec<GridNode>,
}

impl Grid {
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&GridNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the node sitting exactly on `p`.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn node_at(&self, p: Point) -> Option<usize> {
        self.nodes.iter().position(|n| n.pos.x == p.x && n.pos.y == p.y)
    }

    /// Mark a node as forbidden.
    pub fn close(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.closed = true;
        }
    }

    fn address(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then_some(row * self.cols + col)
    }

    fn neighbor(&self, index: usize, heading: Heading) -> Option<usize> {
        let node = self.nodes.get(index)?;
        let (col, row) = (node.col, node.row);
        match heading {
            Heading::Up => self.address(col, row.checked_sub(1)?),
            Heading::Right => self.address(col + 1, row),
            Heading::Down => self.address(col, row + 1),
            Heading::Left => self.address(col.checked_sub(1)?, row),
        }
    }
}

#[allow(clippy::float_cmp)]
fn sorted_unique(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a == b);
    values
}

/// Build the grid from every box edge, the common box, and the line through
/// each dongle perpendicular to its heading.
#[must_use]
pub fn calculate_grid(
    aabbs: &[Bounds],
    start: Point,
    start_heading: Heading,
    end: Point,
    end_heading: Heading,
    common: Bounds,
) -> Grid {
    let mut xs = Vec::with_capacity(aabbs.len() * 2 + 4);
    let mut ys = Vec::with_capacity(aabbs.len() * 2 + 4);
    for (p, heading) in [(start, start_heading), (end, end_heading)] {
        if heading.is_horizontal() {
            ys.push(p.y);
        } else {
            xs.push(p.x);
        }
    }
    for aabb in aabbs.iter().chain(std::iter::once(&common)) {
        xs.extend([aabb.min_x, aabb.max_x]);
        ys.extend([aabb.min_y, aabb.max_y]);
    }
    let xs = sorted_unique(xs);
    let ys = sorted_unique(ys);

    let nodes = ys
        .iter()
        .enumerate()
        .flat_map(|(row, &y)| {
            xs.iter().enumerate().map(move |(col, &x)| GridNode {
                pos: Point::new(x, y),
                col,
                row,
                f: 0.0,
                g: 0.0,
                closed: false,
                visited: false,
                parent: None,
            })
        })
        .collect();
    Grid { rows: ys.len(), cols: xs.len(), nodes }
}

// ── Search ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on f, first-pushed first among equals
        other.f.total_cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest bend-penalized path from `start` to `end`, as node positions.
///
/// Moves that reverse direction, enter the start node along the start
/// heading, enter the end node along the end heading, or whose midpoint lies
/// strictly inside an obstacle are skipped. Each bend costs the cube of the
/// start-end Manhattan distance, so fewer bends always beat shorter length.
pub fn astar(
    grid: &mut Grid,
    start: usize,
    end: usize,
    start_heading: Heading,
    end_heading: Heading,
    obstacles: &[Bounds],
) -> Option<Vec<Point>> {
    let start_pos = grid.nodes.get(start)?.pos;
    let end_pos = grid.nodes.get(end)?.pos;
    let bend = start_pos.manhattan(end_pos);

    let mut open = BinaryHeap::new();
    let mut seq = 0_u64;
    open.push(OpenEntry { f: 0.0, seq, node: start });

    while let Some(entry) = open.pop() {
        let current = entry.node;
        let node = &grid.nodes[current];
        if node.closed || entry.f > node.f {
            continue;
        }
        if current == end {
            return Some(backtrack(grid, current));
        }
        let current_pos = node.pos;
        let current_g = node.g;
        let prev_heading = node
            .parent
            .map_or(start_heading, |parent| Heading::between(grid.nodes[parent].pos, current_pos));
        grid.nodes[current].closed = true;

        for heading in Heading::ALL {
            let Some(next) = grid.neighbor(current, heading) else {
                continue;
            };
            let next_node = &grid.nodes[next];
            if next_node.closed {
                continue;
            }
            let next_pos = next_node.pos;
            let halfway = next_pos.scale_from(current_pos, 0.5);
            if obstacles.iter().any(|b| b.contains_strict(halfway)) {
                continue;
            }
            let reverses = heading == prev_heading.flip()
                || (next == start && heading == start_heading)
                || (next == end && heading == end_heading);
            if reverses {
                continue;
            }

            let turn_cost = if heading == prev_heading { 0.0 } else { bend.powi(3) };
            let g = current_g + next_pos.manhattan(current_pos) + turn_cost;
            if !next_node.visited || g < next_node.g {
                let segments = estimate_segment_count(next_pos, end_pos, heading, end_heading);
                let h = end_pos.manhattan(next_pos) + f64::from(segments) * bend.powi(2);
                let next_node = &mut grid.nodes[next];
                next_node.visited = true;
                next_node.parent = Some(current);
                next_node.g = g;
                next_node.f = g + h;
                seq += 1;
                open.push(OpenEntry { f: g + h, seq, node: next });
            }
        }
    }
    None
}

fn backtrack(grid: &Grid, mut index: usize) -> Vec<Point> {
    let mut path = vec![grid.nodes[index].pos];
    while let Some(parent) = grid.nodes[index].parent {
        path.push(grid.nodes[parent].pos);
        index = parent;
    }
    path.reverse();
    path
}

/// Rough count of the segments still needed to reach `end`, whose shape
/// exits along `end_heading`, when currently moving along `heading`.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn estimate_segment_count(start: Point, end: Point, heading: Heading, end_heading: Heading) -> u32 {
    match (end_heading, heading) {
        (Heading::Right, Heading::Right) | (Heading::Left, Heading::Left)
            if (end_heading == Heading::Right && start.x >= end.x)
                || (end_heading == Heading::Left && start.x <= end.x) =>
        {
            4
        }
        (Heading::Right, Heading::Right) | (Heading::Left, Heading::Left) => {
            if start.y == end.y {
                0
            } else {
                2
            }
        }
        (Heading::Up, Heading::Up) | (Heading::Down, Heading::Down)
            if (end_heading == Heading::Up && start.y >= end.y)
                || (end_heading == Heading::Down && start.y <= end.y) =>
        {
            4
        }
        (Heading::Up, Heading::Up) | (Heading::Down, Heading::Down) => {
            if start.x == end.x {
                0
            } else {
                2
            }
        }
        (Heading::Right, Heading::Left) | (Heading::Left, Heading::Right) => {
            if start.y == end.y {
                4
            } else {
                2
            }
        }
        (Heading::Up, Heading::Down) | (Heading::Down, Heading::Up) => {
            if start.x == end.x {
                4
            } else {
                2
            }
        }
        (Heading::Right, Heading::Up) | (Heading::Up, Heading::Right) => {
            if start.y > end.y && start.x < end.x {
                1
            } else {
                3
            }
        }
        (Heading::Right, Heading::Down) | (Heading::Down, Heading::Right) => {
            if start.y < end.y && start.x < end.x {
                1
            } else {
                3
            }
        }
        (Heading::Left, Heading::Up) | (Heading::Up, Heading::Left) => {
            if start.y > end.y && start.x > end.x {
                1
            } else {
                3
            }
        }
        (Heading::Left, Heading::Down) | (Heading::Down, Heading::Left) => {
            if start.y < end.y && start.x > end.x {
                1
            } else {
                3
            }
        }
    }
}

/// Drop interior points that continue in the same heading as the segment
/// before them.
#[must_use]
pub fn simplify_elbow_arrow_points(points: &[Point]) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        let n = result.len();
        if n >= 2 && Heading::between(result[n - 2], result[n - 1]) == Heading::between(result[n - 1], p) {
            result[n - 1] = p;
        } else {
            result.push(p);
        }
    }
    result
}
