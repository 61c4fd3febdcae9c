use uuid::Uuid;

use super::*;
use crate::element::{BindableKind, Element, PointBinding};
use crate::geom::Point;

fn rect() -> Element {
    Element::shape(BindableKind::Rectangle, 0.0, 0.0, 100.0, 100.0)
}

fn arrow_between(start: Option<ElementId>, end: Option<ElementId>) -> Element {
    let mut arrow = Element::arrow(0.0, 0.0, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
    let linear = arrow.as_linear_mut().unwrap();
    linear.start_binding = start.map(|element_id| PointBinding { element_id, focus: 0.0, gap: 5.0, fixed_point: None });
    linear.end_binding = end.map(|element_id| PointBinding { element_id, focus: 0.0, gap: 5.0, fixed_point: None });
    arrow
}

// =============================================================
// Index
// =============================================================

#[test]
fn index_maps_both_directions() {
    let a = rect();
    let b = rect();
    let arrow = arrow_between(Some(a.id), Some(b.id));
    let (a_id, b_id, arrow_id) = (a.id, b.id, arrow.id);
    let scene = Scene::from_elements(vec![a, b, arrow]);
    let index = BindingIndex::from_scene(&scene);

    assert_eq!(index.arrows_bound_to(&a_id), vec![arrow_id]);
    assert_eq!(index.arrows_bound_to(&b_id), vec![arrow_id]);
    assert_eq!(index.shapes_of(&arrow_id), [Some(a_id), Some(b_id)]);
    assert_eq!(index.bound_shapes().count(), 2);
}

#[test]
fn index_ignores_deleted_arrows_and_unbound_ones() {
    let a = rect();
    let mut gone = arrow_between(Some(a.id), None);
    gone.is_deleted = true;
    let free = arrow_between(None, None);
    let a_id = a.id;
    let scene = Scene::from_elements(vec![a, gone, free]);
    let index = BindingIndex::from_scene(&scene);
    assert!(index.is_empty());
    assert!(index.arrows_bound_to(&a_id).is_empty());
}

// =============================================================
// Audit
// =============================================================

#[test]
fn audit_clean_scene_reports_nothing() {
    let mut a = rect();
    let arrow = arrow_between(Some(a.id), None);
    a.bound_elements.push(BoundElement::arrow(arrow.id));
    let scene = Scene::from_elements(vec![a, arrow]);
    assert!(BindingIndex::from_scene(&scene).audit(&scene).is_empty());
}

#[test]
fn audit_reports_each_mismatch_kind() {
    let mut a = rect();
    let missing_shape = Uuid::new_v4();
    let arrow = arrow_between(Some(a.id), Some(missing_shape));
    let stale = Uuid::new_v4();
    a.bound_elements.push(BoundElement::arrow(stale));
    let (a_id, arrow_id) = (a.id, arrow.id);
    let scene = Scene::from_elements(vec![a, arrow]);

    let issues = BindingIndex::from_scene(&scene).audit(&scene);
    assert_eq!(issues.len(), 3);
    assert!(issues.contains(&BindingMismatch::MissingBackReference { shape_id: a_id, arrow_id }));
    assert!(issues.contains(&BindingMismatch::StaleBackReference { shape_id: a_id, arrow_id: stale }));
    assert!(issues.contains(&BindingMismatch::DanglingBinding { arrow_id, end: EdgeEnd::End, shape_id: missing_shape }));
}

// =============================================================
// Reconcile
// =============================================================

#[test]
fn reconcile_adds_missing_and_drops_stale_arrow_entries() {
    let mut a = rect();
    let arrow = arrow_between(Some(a.id), None);
    let text = BoundElement { id: Uuid::new_v4(), kind: BoundKind::Text };
    a.bound_elements = vec![text, BoundElement::arrow(Uuid::new_v4())];
    let (a_id, arrow_id) = (a.id, arrow.id);
    let mut scene = Scene::from_elements(vec![a, arrow]);

    assert_eq!(reconcile_bound_elements(&mut scene, None), 1);
    let shape = scene.get(&a_id).unwrap();
    assert_eq!(shape.bound_elements, vec![text, BoundElement::arrow(arrow_id)]);
    assert!(BindingIndex::from_scene(&scene).audit(&scene).is_empty());
}

#[test]
fn reconcile_is_idempotent() {
    let a = rect();
    let arrow = arrow_between(Some(a.id), Some(a.id));
    let a_id = a.id;
    let mut scene = Scene::from_elements(vec![a, arrow]);
    assert_eq!(reconcile_bound_elements(&mut scene, Some(&[a_id])), 1);
    let version = scene.get(&a_id).unwrap().version;
    assert_eq!(reconcile_bound_elements(&mut scene, Some(&[a_id])), 0);
    assert_eq!(scene.get(&a_id).unwrap().version, version);
    // one entry even though both ends bind here
    assert_eq!(scene.get(&a_id).unwrap().bound_elements.len(), 1);
}

#[test]
fn reconcile_clears_arrow_entries_on_deleted_shapes() {
    let mut a = rect();
    let arrow = arrow_between(Some(a.id), None);
    a.bound_elements.push(BoundElement::arrow(arrow.id));
    a.is_deleted = true;
    let a_id = a.id;
    let mut scene = Scene::from_elements(vec![a, arrow]);
    reconcile_bound_elements(&mut scene, Some(&[a_id]));
    assert!(scene.get(&a_id).unwrap().bound_elements.is_empty());
}

#[test]
fn reconcile_removes_duplicate_entries() {
    let mut a = rect();
    let arrow = arrow_between(Some(a.id), None);
    a.bound_elements = vec![BoundElement::arrow(arrow.id), BoundElement::arrow(arrow.id)];
    let a_id = a.id;
    let mut scene = Scene::from_elements(vec![a, arrow]);
    assert_eq!(reconcile_bound_elements(&mut scene, None), 1);
    assert_eq!(scene.get(&a_id).unwrap().bound_elements.len(), 1);
}
