//! End-to-end scenarios driven through the public engine API.
#![allow(clippy::float_cmp)]

use tether::binding::DuplicateMode;
use tether::config::BindingConfig;
use tether::element::{BindableKind, BoundElement, EdgeEnd, Element, ElementId, FixedPoint, PointBinding};
use tether::engine::{Action, EngineCore};
use tether::geom::Point;
use tether::input::{Modifiers, ResizeAnchor};
use tether::intersect::max_binding_gap;
use tether::linear;
use tether::route;
use tether::scene::Scene;
use tether::transform;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    Element::shape(BindableKind::Rectangle, x, y, w, h)
}

fn binding(shape: &Element, gap: f64) -> Option<PointBinding> {
    Some(PointBinding { element_id: shape.id, focus: 0.0, gap, fixed_point: None })
}

fn close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-9
}

fn global(engine: &EngineCore, id: &ElementId, index: usize) -> Point {
    let el = engine.element(id).unwrap();
    linear::point_at_index_global(el, index).unwrap()
}

/// Two 100x100 rectangles 200px apart and an arrow bound to both with a 5px gap.
fn two_linked() -> (Vec<Element>, ElementId, ElementId, ElementId) {
    let mut a = rect(0.0, 0.0, 100.0, 100.0);
    let mut b = rect(300.0, 0.0, 100.0, 100.0);
    let mut link = Element::arrow(105.0, 50.0, vec![Point::new(0.0, 0.0), Point::new(190.0, 0.0)]);
    let linear = link.as_linear_mut().unwrap();
    linear.start_binding = binding(&a, 5.0);
    linear.end_binding = binding(&b, 5.0);
    a.bound_elements.push(BoundElement::arrow(link.id));
    b.bound_elements.push(BoundElement::arrow(link.id));
    let ids = (a.id, b.id, link.id);
    (vec![a, b, link], ids.0, ids.1, ids.2)
}

#[test]
fn translating_left_shape_moves_only_arrow_start() {
    init_tracing();
    let (elements, a_id, _, link_id) = two_linked();
    let mut engine = EngineCore::new();
    engine.load_snapshot(elements);

    engine.set_selection(&[a_id]);
    engine.begin_drag(Point::new(50.0, 50.0));
    engine.on_pointer_move(Point::new(100.0, 50.0), Modifiers::default());
    let actions = engine.on_pointer_up(Modifiers::default());
    assert!(!actions.iter().any(|a| matches!(a, Action::RouteFailed { .. })));

    // new right edge at x=150, plus the 5px gap
    assert!(close(global(&engine, &link_id, 0), Point::new(155.0, 50.0)));
    assert!(close(global(&engine, &link_id, 1), Point::new(295.0, 50.0)));
    assert!(engine.audit().is_empty());
}

#[test]
fn elbow_between_aligned_boxes_is_straight() {
    init_tracing();
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(300.0, 0.0, 100.0, 100.0);
    let mut elbow = Element::elbow_arrow(105.0, 50.0, vec![Point::new(0.0, 0.0), Point::new(190.0, 0.0)]);
    let linear = elbow.as_linear_mut().unwrap();
    linear.start_binding =
        Some(PointBinding { element_id: a.id, focus: 0.0, gap: 5.0, fixed_point: Some(FixedPoint::new(1.05, 0.5001)) });
    linear.end_binding =
        Some(PointBinding { element_id: b.id, focus: 0.0, gap: 5.0, fixed_point: Some(FixedPoint::new(-0.05, 0.5001)) });
    let elbow_id = elbow.id;
    let mut scene = Scene::from_elements(vec![a, b, elbow]);

    route::reroute_elbow_arrow(&mut scene, &BindingConfig::default(), &elbow_id).unwrap();
    let el = scene.get(&elbow_id).unwrap();
    assert!((el.x - 105.0).abs() < 1e-9);
    assert!((el.y - 50.01).abs() < 1e-9);
    let points = &el.as_linear().unwrap().points;
    assert_eq!(points.len(), 2);
    assert!(close(points[0], Point::new(0.0, 0.0)));
    assert!(close(points[1], Point::new(190.0, 0.0)));
}

#[test]
fn deleting_hub_clears_every_arrow() {
    init_tracing();
    let mut hub = rect(200.0, 200.0, 100.0, 100.0);
    let mut elements = Vec::new();
    let mut arrows = Vec::new();
    for (sx, sy) in [(0.0, 0.0), (400.0, 0.0), (0.0, 400.0)] {
        let mut spoke = rect(sx, sy, 100.0, 100.0);
        let mut arrow = Element::arrow(sx + 50.0, sy + 50.0, vec![Point::new(0.0, 0.0), Point::new(200.0 - sx, 200.0 - sy)]);
        let linear = arrow.as_linear_mut().unwrap();
        linear.start_binding = binding(&spoke, 5.0);
        linear.end_binding = binding(&hub, 5.0);
        spoke.bound_elements.push(BoundElement::arrow(arrow.id));
        hub.bound_elements.push(BoundElement::arrow(arrow.id));
        arrows.push(arrow.id);
        elements.push(spoke);
        elements.push(arrow);
    }
    let hub_id = hub.id;
    elements.push(hub);
    let mut engine = EngineCore::new();
    engine.load_snapshot(elements);

    let actions = engine.delete_elements(&[hub_id]);
    assert!(actions.contains(&Action::ElementDeleted { id: hub_id }));
    for arrow_id in &arrows {
        let linear = engine.element(arrow_id).unwrap().as_linear().unwrap();
        assert!(linear.end_binding.is_none());
        assert!(linear.start_binding.is_some());
        assert!(actions.contains(&Action::ElementUpdated { id: *arrow_id }));
    }
    let hub = engine.element(&hub_id).unwrap();
    assert!(hub.is_deleted);
    assert!(hub.bound_elements.is_empty());
    assert!(engine.audit().is_empty());
}

#[test]
fn duplicated_arrow_follows_duplicated_shape() {
    init_tracing();
    let (elements, a_id, b_id, link_id) = two_linked();
    let mut engine = EngineCore::new();
    engine.load_snapshot(elements);

    let (map, _) = engine.duplicate_elements(&[a_id, link_id], DuplicateMode::Normal);
    let copy = engine.element(&map[&link_id]).unwrap().as_linear().unwrap();
    assert_eq!(copy.binding(EdgeEnd::Start).unwrap().element_id, map[&a_id]);
    // the shape left out of the duplication keeps serving both arrows
    assert_eq!(copy.binding(EdgeEnd::End).unwrap().element_id, b_id);
    let b = engine.element(&b_id).unwrap();
    assert!(b.has_bound_arrow(link_id) && b.has_bound_arrow(map[&link_id]));
    assert!(engine.element(&map[&a_id]).unwrap().has_bound_arrow(map[&link_id]));
    assert!(!engine.element(&a_id).unwrap().has_bound_arrow(map[&link_id]));
    assert!(engine.audit().is_empty());
}

#[test]
fn gap_scales_with_shape_and_stays_clamped() {
    init_tracing();
    let config = BindingConfig::default();
    let mut previous = 0.0;
    for k in [0.5, 1.0, 2.0, 10.0] {
        let mut shape = rect(0.0, 0.0, 100.0, 100.0);
        let mut arrow = Element::arrow(110.0, 50.0, vec![Point::new(0.0, 0.0), Point::new(1390.0, 0.0)]);
        arrow.as_linear_mut().unwrap().start_binding = binding(&shape, 10.0);
        shape.bound_elements.push(BoundElement::arrow(arrow.id));
        let (shape_id, arrow_id) = (shape.id, arrow.id);
        let orig = shape.clone();
        let mut scene = Scene::from_elements(vec![shape, arrow]);

        let pointer = Point::new(100.0 * k, 100.0 * k);
        transform::resize_single(&mut scene, &config, &orig, ResizeAnchor::Se, pointer, Modifiers::default());
        assert_eq!(scene.get(&shape_id).unwrap().width, 100.0 * k);

        let gap = scene.get(&arrow_id).unwrap().as_linear().unwrap().start_binding.unwrap().gap;
        let expected = 1f64.max(max_binding_gap(BindableKind::Rectangle, 100.0 * k, 100.0 * k).min(10.0 * k));
        assert!((gap - expected).abs() < 1e-9, "k={k}: gap {gap}, expected {expected}");
        assert!(gap >= previous);
        previous = gap;
    }
}
