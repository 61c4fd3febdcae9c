#![allow(clippy::float_cmp)]

use std::f64::consts::{FRAC_PI_2, TAU};

use super::*;
use crate::element::{BindableKind, BoundElement, PointBinding};

fn rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    Element::shape(BindableKind::Rectangle, x, y, w, h)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn assert_bounds(actual: Bounds, expected: Bounds) {
    let ok = approx(actual.min_x, expected.min_x)
        && approx(actual.min_y, expected.min_y)
        && approx(actual.max_x, expected.max_x)
        && approx(actual.max_y, expected.max_y);
    assert!(ok, "expected {expected:?}, got {actual:?}");
}

/// A at (0,0) and B at (300,0), 100x100, with an arrow from A's right side to
/// B's left side, bound at both ends with a 5px gap.
fn linked() -> (Scene, ElementId, ElementId, ElementId) {
    let mut a = rect(0.0, 0.0, 100.0, 100.0);
    let mut b = rect(300.0, 0.0, 100.0, 100.0);
    let mut link = Element::arrow(105.0, 50.0, vec![Point::new(0.0, 0.0), Point::new(190.0, 0.0)]);
    let linear = link.as_linear_mut().unwrap();
    linear.start_binding = Some(PointBinding { element_id: a.id, focus: 0.0, gap: 5.0, fixed_point: None });
    linear.end_binding = Some(PointBinding { element_id: b.id, focus: 0.0, gap: 5.0, fixed_point: None });
    a.bound_elements.push(BoundElement::arrow(link.id));
    b.bound_elements.push(BoundElement::arrow(link.id));
    let ids = (a.id, b.id, link.id);
    (Scene::from_elements(vec![a, b, link]), ids.0, ids.1, ids.2)
}

// =============================================================
// Drag
// =============================================================

#[test]
fn dragging_shape_alone_pulls_arrow_end() {
    let (mut scene, a_id, _, link_id) = linked();
    let config = BindingConfig::default();
    let errors = drag_selected_elements(&mut scene, &config, &[a_id], Vector::new(50.0, 0.0));
    assert!(errors.is_empty());
    assert_eq!(scene.get(&a_id).unwrap().x, 50.0);
    let link = scene.get(&link_id).unwrap();
    assert!(approx(link.x, 155.0));
    assert!(approx(link.as_linear().unwrap().points[1].x, 140.0));
}

#[test]
fn dragging_shape_with_its_arrow_moves_both_rigidly() {
    let (mut scene, a_id, _, link_id) = linked();
    let config = BindingConfig::default();
    drag_selected_elements(&mut scene, &config, &[a_id, link_id], Vector::new(50.0, 20.0));
    let link = scene.get(&link_id).unwrap();
    assert_eq!((link.x, link.y), (155.0, 70.0));
    assert_eq!(link.as_linear().unwrap().points, vec![Point::new(0.0, 0.0), Point::new(190.0, 0.0)]);
}

// =============================================================
// Rotate
// =============================================================

#[test]
fn rotation_angle_measured_from_straight_up() {
    let center = Point::new(0.0, 0.0);
    let up = rotation_angle(center, Point::new(0.0, -10.0), None);
    assert!(up.min(TAU - up) < 1e-9);
    assert!(approx(rotation_angle(center, Point::new(10.0, 0.0), None), FRAC_PI_2));
}

#[test]
fn rotation_snaps_to_nearest_step() {
    let center = Point::new(0.0, 0.0);
    let step = 15f64.to_radians();
    let at = |theta: f64| Point::new(10.0 * theta.sin(), -10.0 * theta.cos());
    let small = rotation_angle(center, at(0.1), Some(step));
    assert!(small.min(TAU - small) < 1e-9);
    assert!(approx(rotation_angle(center, at(0.2), Some(step)), step));
}

#[test]
fn rotate_single_sets_angle_and_skips_elbows() {
    let shape = rect(0.0, 0.0, 100.0, 100.0);
    let elbow = Element::elbow_arrow(200.0, 0.0, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    let (shape_id, elbow_id) = (shape.id, elbow.id);
    let mut scene = Scene::from_elements(vec![shape, elbow]);
    let config = BindingConfig::default();

    rotate_single(&mut scene, &config, &shape_id, Point::new(150.0, 50.0), Modifiers::default());
    assert!(approx(scene.get(&shape_id).unwrap().angle, FRAC_PI_2));

    let version = scene.get(&elbow_id).unwrap().version;
    rotate_single(&mut scene, &config, &elbow_id, Point::new(250.0, 100.0), Modifiers::default());
    assert_eq!(scene.get(&elbow_id).unwrap().version, version);
    assert_eq!(scene.get(&elbow_id).unwrap().angle, 0.0);
}

#[test]
fn rotate_multiple_swaps_positions_at_half_turn() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(200.0, 0.0, 100.0, 100.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut scene = Scene::from_elements(vec![a, b]);
    let config = BindingConfig::default();

    rotate_multiple(&mut scene, &config, &[a_id, b_id], Point::new(150.0, 50.0), PI);
    let a = scene.get(&a_id).unwrap();
    assert!((a.x - 200.0).abs() < 1e-6 && a.y.abs() < 1e-6);
    assert!(approx(a.angle, PI));
    assert!(scene.get(&b_id).unwrap().x.abs() < 1e-6);
}

// =============================================================
// Resize box
// =============================================================

#[test]
fn resize_corner_keeps_opposite_corner() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let next = resize_box(orig, 0.0, ResizeAnchor::Se, Point::new(150.0, 120.0), Modifiers::default());
    assert_bounds(next, Bounds::new(0.0, 0.0, 150.0, 120.0));
}

#[test]
fn resize_shift_keeps_aspect_ratio() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let shift = Modifiers { shift: true, ..Modifiers::default() };
    let next = resize_box(orig, 0.0, ResizeAnchor::Se, Point::new(150.0, 120.0), shift);
    assert_bounds(next, Bounds::new(0.0, 0.0, 150.0, 150.0));

    let side = resize_box(orig, 0.0, ResizeAnchor::E, Point::new(200.0, 50.0), shift);
    assert_bounds(side, Bounds::new(0.0, -50.0, 200.0, 150.0));
}

#[test]
fn resize_alt_grows_from_center() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let alt = Modifiers { alt: true, ..Modifiers::default() };
    let next = resize_box(orig, 0.0, ResizeAnchor::E, Point::new(130.0, 50.0), alt);
    assert_bounds(next, Bounds::new(-30.0, 0.0, 130.0, 100.0));
}

#[test]
fn resize_west_handle_moves_left_edge() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let next = resize_box(orig, 0.0, ResizeAnchor::W, Point::new(20.0, 50.0), Modifiers::default());
    assert_bounds(next, Bounds::new(20.0, 0.0, 100.0, 100.0));
}

#[test]
fn resize_never_collapses_below_minimum() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let next = resize_box(orig, 0.0, ResizeAnchor::Se, Point::new(-50.0, -50.0), Modifiers::default());
    assert!(approx(next.width(), 1.0) && approx(next.height(), 1.0));
}

#[test]
fn resize_rotated_box_pins_pivot_in_world() {
    let orig = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let angle = FRAC_PI_2;
    let pointer = rotate_point(Point::new(150.0, 100.0), Point::new(50.0, 50.0), angle);
    let next = resize_box(orig, angle, ResizeAnchor::Se, pointer, Modifiers::default());
    assert_bounds(next, Bounds::new(-25.0, 25.0, 125.0, 125.0));
    // the unrotated top-left corner is the pivot; it stays at world (100, 0)
    let pinned = rotate_point(Point::new(next.min_x, next.min_y), next.center(), angle);
    assert!(pinned.distance(Point::new(100.0, 0.0)) < 1e-9);
}

// =============================================================
// Resize elements
// =============================================================

#[test]
fn resize_single_shape_pulls_bound_arrow() {
    let (mut scene, a_id, _, link_id) = linked();
    let config = BindingConfig::default();
    let orig = scene.get(&a_id).unwrap().clone();

    let errors = resize_single(&mut scene, &config, &orig, ResizeAnchor::E, Point::new(150.0, 50.0), Modifiers::default());
    assert!(errors.is_empty());
    let a = scene.get(&a_id).unwrap();
    assert_eq!((a.x, a.y, a.width, a.height), (0.0, 0.0, 150.0, 100.0));
    let link = scene.get(&link_id).unwrap();
    assert!(approx(link.x, 155.0));
    assert!(approx(link.as_linear().unwrap().start_binding.unwrap().gap, 5.0));
}

#[test]
fn resize_single_line_scales_points() {
    let line = Element::line(0.0, 0.0, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    let id = line.id;
    let orig = line.clone();
    let mut scene = Scene::from_elements(vec![line]);
    let config = BindingConfig::default();

    resize_single(&mut scene, &config, &orig, ResizeAnchor::E, Point::new(200.0, 0.0), Modifiers::default());
    let el = scene.get(&id).unwrap();
    assert!(approx(el.x, 0.0) && approx(el.y, 0.0));
    let points = &el.as_linear().unwrap().points;
    assert!(approx(points[1].x, 200.0) && approx(points[1].y, 0.0));
}

#[test]
fn resize_multiple_scales_uniformly_from_pivot() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(200.0, 0.0, 100.0, 100.0);
    let (a_id, b_id) = (a.id, b.id);
    let originals = vec![a.clone(), b.clone()];
    let mut scene = Scene::from_elements(vec![a, b]);
    let config = BindingConfig::default();
    let bounds = Bounds::new(0.0, 0.0, 300.0, 100.0);

    resize_multiple(&mut scene, &config, &originals, bounds, ResizeAnchor::Se, Point::new(600.0, 100.0), Modifiers::default());
    let a = scene.get(&a_id).unwrap();
    let b = scene.get(&b_id).unwrap();
    assert_eq!((a.x, a.y, a.width, a.height), (0.0, 0.0, 200.0, 200.0));
    assert_eq!((b.x, b.y, b.width, b.height), (400.0, 0.0, 200.0, 200.0));
}

#[test]
fn resize_multiple_ignores_flipping_drag() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let a_id = a.id;
    let originals = vec![a.clone()];
    let mut scene = Scene::from_elements(vec![a]);
    let config = BindingConfig::default();
    let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);

    resize_multiple(&mut scene, &config, &originals, bounds, ResizeAnchor::E, Point::new(-10.0, 50.0), Modifiers::default());
    assert_eq!(scene.get(&a_id).unwrap().width, 100.0);
}
