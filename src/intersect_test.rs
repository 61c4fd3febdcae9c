#![allow(clippy::float_cmp)]

use std::f64::consts::FRAC_PI_2;

use uuid::Uuid;

use super::*;

fn shape(kind: BindableKind, x: f64, y: f64, width: f64, height: f64) -> BindableShape {
    BindableShape { id: Uuid::nil(), kind, x, y, width, height, angle: 0.0 }
}

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

fn point_close(a: Point, b: Point) -> bool {
    close(a.x, b.x, 1e-6) && close(a.y, b.y, 1e-6)
}

// =============================================================
// Line
// =============================================================

#[test]
fn line_through_coincident_points_is_none() {
    assert!(Line::through(Point::new(1.0, 1.0), Point::new(1.0, 1.0)).is_none());
}

#[test]
fn line_signed_distance_is_normalized() {
    let line = Line::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0)).unwrap();
    assert!(close(line.signed_distance(Point::new(5.0, 3.0)).abs(), 3.0, 1e-12));
    assert_eq!(line.signed_distance(Point::new(7.0, 0.0)), 0.0);
}

// =============================================================
// max_binding_gap
// =============================================================

#[test]
fn max_gap_clamps_between_16_and_32() {
    assert_eq!(max_binding_gap(BindableKind::Rectangle, 100.0, 100.0), 25.0);
    assert_eq!(max_binding_gap(BindableKind::Rectangle, 10.0, 400.0), 16.0);
    assert_eq!(max_binding_gap(BindableKind::Rectangle, 1000.0, 1000.0), 32.0);
}

#[test]
fn max_gap_diamond_scaled_by_inverse_sqrt2() {
    let gap = max_binding_gap(BindableKind::Diamond, 100.0, 100.0);
    assert!(close(gap, 25.0 * FRAC_1_SQRT_2, 1e-12));
}

// =============================================================
// distance_to_bindable_element
// =============================================================

#[test]
fn rectangle_distance_signed() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    assert_eq!(distance_to_bindable_element(&r, Point::new(150.0, 50.0)), 50.0);
    assert_eq!(distance_to_bindable_element(&r, Point::new(50.0, 50.0)), -50.0);
    assert_eq!(distance_to_bindable_element(&r, Point::new(100.0, 20.0)), 0.0);
}

#[test]
fn rectangular_family_shares_formula() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 80.0, 40.0);
    let t = shape(BindableKind::Text, 0.0, 0.0, 80.0, 40.0);
    let p = Point::new(95.0, 10.0);
    assert_eq!(distance_to_bindable_element(&r, p), distance_to_bindable_element(&t, p));
}

#[test]
fn rotated_rectangle_distance_uses_local_frame() {
    let mut r = shape(BindableKind::Rectangle, 0.0, 0.0, 200.0, 100.0);
    r.angle = FRAC_PI_2;
    // After a quarter turn the long side is vertical: (100, -60) is 10 above the top.
    assert!(close(distance_to_bindable_element(&r, Point::new(100.0, -60.0)), 10.0, 1e-9));
}

#[test]
fn diamond_distance() {
    let d = shape(BindableKind::Diamond, 0.0, 0.0, 100.0, 100.0);
    assert!(close(distance_to_bindable_element(&d, Point::new(50.0, 0.0)), 0.0, 1e-9));
    assert!(close(distance_to_bindable_element(&d, Point::new(150.0, 50.0)), 50.0 * FRAC_1_SQRT_2, 1e-9));
    assert!(distance_to_bindable_element(&d, Point::new(50.0, 50.0)) < 0.0);
}

#[test]
fn ellipse_distance_on_circle_is_radial() {
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 100.0, 100.0);
    assert!(close(distance_to_bindable_element(&e, Point::new(150.0, 50.0)), 50.0, 1e-9));
    assert!(close(distance_to_bindable_element(&e, Point::new(50.0, 50.0)), -50.0, 1e-9));
}

#[test]
fn ellipse_distance_on_axes() {
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 200.0, 100.0);
    assert!(close(distance_to_bindable_element(&e, Point::new(250.0, 50.0)), 50.0, 1e-6));
    assert!(close(distance_to_bindable_element(&e, Point::new(100.0, 130.0)), 30.0, 1e-6));
}

#[test]
fn ellipse_distance_follows_outline_normal_off_axis() {
    // semi-axes 100 and 50, centered at (100, 50)
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 200.0, 100.0);
    let theta = 30f64.to_radians();
    let foot = Point::new(100.0 * theta.cos(), 50.0 * theta.sin());
    let normal = Vector::new(theta.cos() / 100.0, theta.sin() / 50.0);
    let unit = Vector::new(normal.x / normal.x.hypot(normal.y), normal.y / normal.x.hypot(normal.y));
    for offset in [-10.0, 0.0, 20.0] {
        let p = Point::new(100.0 + foot.x + unit.x * offset, 50.0 + foot.y + unit.y * offset);
        let d = distance_to_bindable_element(&e, p);
        assert!(close(d, offset, 1e-6), "offset {offset}: got {d}");
    }
}

#[test]
fn zero_size_ellipse_does_not_produce_nan() {
    let e = shape(BindableKind::Ellipse, 10.0, 10.0, 0.0, 0.0);
    let d = distance_to_bindable_element(&e, Point::new(13.0, 14.0));
    assert!(d.is_finite());
    assert!(close(d, 5.0, 1e-9));
}

// =============================================================
// intersect_element_with_line
// =============================================================

#[test]
fn line_through_rectangle_hits_twice_nearest_first() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let hits = intersect_element_with_line(&r, Point::new(-50.0, 50.0), Point::new(150.0, 50.0), 0.0);
    assert_eq!(hits.len(), 2);
    assert!(point_close(hits[0], Point::new(0.0, 50.0)));
    assert!(point_close(hits[1], Point::new(100.0, 50.0)));
}

#[test]
fn line_through_rectangle_with_gap_hits_inflated_outline() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let hits = intersect_element_with_line(&r, Point::new(200.0, 50.0), Point::new(150.0, 50.0), 10.0);
    assert_eq!(hits.len(), 2);
    assert!(point_close(hits[0], Point::new(110.0, 50.0)));
    assert!(point_close(hits[1], Point::new(-10.0, 50.0)));
}

#[test]
fn line_missing_rectangle_hits_nothing() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    assert!(intersect_element_with_line(&r, Point::new(-50.0, 200.0), Point::new(150.0, 200.0), 0.0).is_empty());
}

#[test]
fn line_grazing_single_corner_is_discarded() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let hits = intersect_element_with_line(&r, Point::new(50.0, -50.0), Point::new(150.0, 50.0), 0.0);
    assert!(hits.is_empty());
}

#[test]
fn diagonal_through_two_corners_hits_both() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let hits = intersect_element_with_line(&r, Point::new(-10.0, -10.0), Point::new(110.0, 110.0), 0.0);
    assert_eq!(hits.len(), 2);
    assert!(point_close(hits[0], Point::new(0.0, 0.0)));
    assert!(point_close(hits[1], Point::new(100.0, 100.0)));
}

#[test]
fn line_through_diamond_hits_edges() {
    let d = shape(BindableKind::Diamond, 0.0, 0.0, 100.0, 100.0);
    let hits = intersect_element_with_line(&d, Point::new(-50.0, 50.0), Point::new(150.0, 50.0), 0.0);
    assert_eq!(hits.len(), 2);
    assert!(point_close(hits[0], Point::new(0.0, 50.0)));
    assert!(point_close(hits[1], Point::new(100.0, 50.0)));
}

#[test]
fn line_through_ellipse_hits_twice() {
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 200.0, 100.0);
    let hits = intersect_element_with_line(&e, Point::new(100.0, -100.0), Point::new(100.0, 0.0), 5.0);
    assert_eq!(hits.len(), 2);
    assert!(point_close(hits[0], Point::new(100.0, -5.0)));
    assert!(point_close(hits[1], Point::new(100.0, 105.0)));
}

#[test]
fn line_missing_ellipse_hits_nothing() {
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 100.0, 100.0);
    assert!(intersect_element_with_line(&e, Point::new(-10.0, 120.0), Point::new(10.0, 120.0), 0.0).is_empty());
}

#[test]
fn coincident_line_points_hit_nothing() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let p = Point::new(50.0, 50.0);
    assert!(intersect_element_with_line(&r, p, p, 0.0).is_empty());
}

// =============================================================
// Focus
// =============================================================

#[test]
fn focus_of_horizontal_line_is_offset_over_half_height() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let focus = determine_focus_distance(&r, Point::new(-1000.0, 60.0), Point::new(-5.0, 60.0));
    assert!(close(focus.abs(), 0.2, 1e-9));
}

#[test]
fn focus_through_center_is_zero() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    let focus = determine_focus_distance(&r, Point::new(-100.0, 50.0), Point::new(0.0, 50.0));
    assert!(close(focus, 0.0, 1e-12));
}

#[test]
fn focus_degenerate_line_is_zero() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0);
    assert_eq!(determine_focus_distance(&r, Point::new(5.0, 5.0), Point::new(5.0, 5.0)), 0.0);
}

#[test]
fn focus_zero_width_is_zero_not_nan() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 0.0, 100.0);
    assert_eq!(determine_focus_distance(&r, Point::new(-100.0, 60.0), Point::new(-5.0, 60.0)), 0.0);
}

#[test]
fn focus_point_zero_is_center() {
    let r = shape(BindableKind::Ellipse, 0.0, 0.0, 100.0, 40.0);
    assert_eq!(determine_focus_point(&r, 0.0, Point::new(-50.0, 0.0)), Point::new(50.0, 20.0));
}

fn assert_focus_point_on_line(s: BindableShape, adjacent: Point, edge: Point) {
    let kind = s.kind;
    let focus = determine_focus_distance(&s, adjacent, edge);
    assert!(focus != 0.0);
    let point = determine_focus_point(&s, focus, adjacent);
    let line = Line::through(adjacent, edge).unwrap();
    assert!(line.signed_distance(point).abs() < 1e-6, "{kind:?}: {point:?} off the line");
}

#[test]
fn focus_point_lies_on_original_line_rectangle() {
    let r = shape(BindableKind::Rectangle, 0.0, 0.0, 200.0, 100.0);
    assert_focus_point_on_line(r, Point::new(-200.0, -100.0), Point::new(0.0, 20.0));
    assert_focus_point_on_line(r, Point::new(400.0, 300.0), Point::new(190.0, 100.0));
}

#[test]
fn focus_point_lies_on_original_line_diamond() {
    let d = shape(BindableKind::Diamond, 0.0, 0.0, 100.0, 100.0);
    assert_focus_point_on_line(d, Point::new(-200.0, -100.0), Point::new(20.0, 30.0));
    assert_focus_point_on_line(d, Point::new(-200.0, -100.0), Point::new(10.0, 60.0));
}

#[test]
fn focus_point_lies_on_original_line_ellipse() {
    let e = shape(BindableKind::Ellipse, 0.0, 0.0, 200.0, 100.0);
    assert_focus_point_on_line(e, Point::new(-300.0, -50.0), Point::new(0.0, 60.0));
    assert_focus_point_on_line(e, Point::new(500.0, 80.0), Point::new(200.0, 30.0));
}

#[test]
fn focus_point_respects_rotation() {
    let mut s = shape(BindableKind::Rectangle, 0.0, 0.0, 200.0, 100.0);
    s.angle = 0.4;
    let adjacent = Point::new(-200.0, -100.0);
    let edge = Point::new(10.0, 40.0);
    let focus = determine_focus_distance(&s, adjacent, edge);
    let point = determine_focus_point(&s, focus, adjacent);
    let line = Line::through(adjacent, edge).unwrap();
    assert!(line.signed_distance(point).abs() < 1e-6);
}
