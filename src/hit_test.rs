use super::*;
use crate::element::{BindableKind, Element, PointBinding};

fn rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    Element::shape(BindableKind::Rectangle, x, y, w, h)
}

fn bound_arrow(x: f64, y: f64, len: f64, start: Option<ElementId>, end: Option<ElementId>) -> Element {
    let mut arrow = Element::arrow(x, y, vec![Point::new(0.0, 0.0), Point::new(len, 0.0)]);
    let linear = arrow.as_linear_mut().unwrap();
    linear.start_binding = start.map(|element_id| PointBinding { element_id, focus: 0.0, gap: 5.0, fixed_point: None });
    linear.end_binding = end.map(|element_id| PointBinding { element_id, focus: 0.0, gap: 5.0, fixed_point: None });
    arrow
}

// =============================================================
// Border test
// =============================================================

#[test]
fn border_test_near_outline_both_sides() {
    let shape = rect(0.0, 0.0, 100.0, 100.0).as_bindable().unwrap();
    // threshold is 25 for a 100x100 rectangle
    assert!(binding_border_test(&shape, Point::new(120.0, 50.0), false));
    assert!(binding_border_test(&shape, Point::new(80.0, 50.0), false));
    assert!(!binding_border_test(&shape, Point::new(130.0, 50.0), false));
}

#[test]
fn border_test_center_requires_full_shape() {
    let shape = rect(0.0, 0.0, 100.0, 100.0).as_bindable().unwrap();
    let center = Point::new(50.0, 50.0);
    assert!(!binding_border_test(&shape, center, false));
    assert!(binding_border_test(&shape, center, true));
}

#[test]
fn border_threshold_clamped_for_small_shapes() {
    let shape = rect(0.0, 0.0, 10.0, 10.0).as_bindable().unwrap();
    assert!(binding_border_test(&shape, Point::new(25.0, 5.0), false));
    assert!(!binding_border_test(&shape, Point::new(27.0, 5.0), false));
}

// =============================================================
// Hovered element
// =============================================================

#[test]
fn hovered_prefers_topmost() {
    let low = rect(0.0, 0.0, 100.0, 100.0).with_z_index(0);
    let high = rect(10.0, 0.0, 100.0, 100.0).with_z_index(1);
    let high_id = high.id;
    let scene = Scene::from_elements(vec![low, high]);
    let hovered = hovered_element_for_binding(&scene, Point::new(105.0, 50.0), false).unwrap();
    assert_eq!(hovered.id, high_id);
}

#[test]
fn hovered_skips_arrows_and_deleted() {
    let mut deleted = rect(0.0, 0.0, 100.0, 100.0);
    deleted.is_deleted = true;
    let arrow = Element::arrow(90.0, 50.0, vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0)]);
    let scene = Scene::from_elements(vec![deleted, arrow]);
    assert!(hovered_element_for_binding(&scene, Point::new(100.0, 50.0), true).is_none());
}

#[test]
fn hovered_excluding_ignores_listed_shapes() {
    let r = rect(0.0, 0.0, 100.0, 100.0);
    let id = r.id;
    let scene = Scene::from_elements(vec![r]);
    assert!(hovered_element_excluding(&scene, Point::new(100.0, 50.0), false, &[id]).is_none());
    assert!(hovered_element_excluding(&scene, Point::new(100.0, 50.0), false, &[]).is_some());
}

#[test]
fn eligible_element_uses_arrow_end() {
    let r = rect(200.0, 0.0, 100.0, 100.0);
    let id = r.id;
    let arrow = bound_arrow(50.0, 50.0, 140.0, None, None);
    let arrow_id = arrow.id;
    let scene = Scene::from_elements(vec![r, arrow]);
    assert_eq!(eligible_element_for_binding(&scene, &arrow_id, EdgeEnd::End).map(|s| s.id), Some(id));
    assert!(eligible_element_for_binding(&scene, &arrow_id, EdgeEnd::Start).is_none());
}

// =============================================================
// Suggestions
// =============================================================

#[test]
fn still_close_bindings_reported_per_end() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(300.0, 0.0, 100.0, 100.0);
    let (a_id, b_id) = (a.id, b.id);
    // start sits 5px from a; end is 60px from b
    let arrow = bound_arrow(105.0, 50.0, 135.0, Some(a_id), Some(b_id));
    let arrow_id = arrow.id;
    let scene = Scene::from_elements(vec![a, b, arrow]);
    let [start, end] = original_bindings_if_still_close(&scene, &arrow_id);
    assert_eq!(start.map(|s| s.id), Some(a_id));
    assert!(end.is_none());
}

#[test]
fn suggestions_exclude_selected_shapes_and_dedupe() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let a_id = a.id;
    let first = bound_arrow(105.0, 50.0, 50.0, Some(a_id), None);
    let second = bound_arrow(105.0, 60.0, 50.0, Some(a_id), None);
    let ids = vec![first.id, second.id];
    let scene = Scene::from_elements(vec![a, first, second]);
    let config = BindingConfig::default();

    let suggestions = suggested_bindings(&scene, &config, &ids);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].id, a_id);

    let mut with_shape = ids.clone();
    with_shape.push(a_id);
    assert!(suggested_bindings(&scene, &config, &with_shape).is_empty());
}

#[test]
fn suggestions_cut_off_above_limit() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let a_id = a.id;
    let arrow = bound_arrow(105.0, 50.0, 50.0, Some(a_id), None);
    let arrow_id = arrow.id;
    let scene = Scene::from_elements(vec![a, arrow]);
    let config = BindingConfig { suggestion_selection_limit: 1, ..BindingConfig::default() };

    assert_eq!(suggested_bindings(&scene, &config, &[arrow_id]).len(), 1);
    let crowded = [arrow_id, ElementId::new_v4()];
    assert!(suggested_bindings(&scene, &config, &crowded).is_empty());
    assert!(suggested_binding_at(&scene, &config, Point::new(100.0, 50.0), &crowded, false).is_none());
    assert!(suggested_binding_at(&scene, &config, Point::new(100.0, 50.0), &[arrow_id], false).is_some());
}
