//! Binding search: which shape an arrow end would attach to.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use tracing::debug;

use crate::config::BindingConfig;
use crate::element::{BindableShape, EdgeEnd, ElementId};
use crate::geom::Point;
use crate::intersect::{distance_to_bindable_element, max_binding_gap};
use crate::linear;
use crate::scene::Scene;

/// Whether `p` is close enough to the outline of `shape` to bind.
///
/// With `full_shape`, anywhere inside the shape's bounding box also counts.
#[must_use]
pub fn binding_border_test(shape: &BindableShape, p: Point, full_shape: bool) -> bool {
    let threshold = max_binding_gap(shape.kind, shape.width, shape.height);
    distance_to_bindable_element(shape, p).abs() <= threshold || (full_shape && shape.aabb().contains_strict(p))
}

/// Topmost live bindable shape whose border passes [`binding_border_test`].
#[must_use]
pub fn hovered_element_for_binding(scene: &Scene, p: Point, full_shape: bool) -> Option<BindableShape> {
    hovered_element_excluding(scene, p, full_shape, &[])
}

/// Like [`hovered_element_for_binding`], ignoring the shapes in `exclude`.
#[must_use]
pub fn hovered_element_excluding(
    scene: &Scene,
    p: Point,
    full_shape: bool,
    exclude: &[ElementId],
) -> Option<BindableShape> {
    scene
        .sorted_elements()
        .into_iter()
        .rev()
        .filter(|el| !exclude.contains(&el.id))
        .filter_map(|el| el.as_bindable())
        .find(|shape| binding_border_test(shape, p, full_shape))
}

/// Shape that the given end of `arrow_id` would bind to right now.
#[must_use]
pub fn eligible_element_for_binding(scene: &Scene, arrow_id: &ElementId, end: EdgeEnd) -> Option<BindableShape> {
    let el = scene.get_non_deleted(arrow_id)?;
    let linear = el.as_arrow()?;
    let p = linear::point_at_index_global(el, linear.end_index(end)?)?;
    hovered_element_for_binding(scene, p, linear.elbowed)
}

/// The shapes each end of `arrow_id` is bound to, if that end is still
/// within the shape's binding border. `[start, end]`.
#[must_use]
pub fn original_bindings_if_still_close(scene: &Scene, arrow_id: &ElementId) -> [Option<BindableShape>; 2] {
    let Some(el) = scene.get_non_deleted(arrow_id) else {
        return [None, None];
    };
    let Some(linear) = el.as_arrow() else {
        return [None, None];
    };
    [EdgeEnd::Start, EdgeEnd::End].map(|end| {
        let binding = linear.binding(end)?;
        let shape = scene.bindable(&binding.element_id)?;
        let p = linear::point_at_index_global(el, linear.end_index(end)?)?;
        binding_border_test(&shape, p, false).then_some(shape)
    })
}

/// Shapes to highlight while `selected` is being dragged.
///
/// These are the shapes the selected arrows are still close enough to stay
/// bound to, excluding shapes that are themselves selected. Selections larger
/// than the configured limit get no suggestions.
#[must_use]
pub fn suggested_bindings(scene: &Scene, config: &BindingConfig, selected: &[ElementId]) -> Vec<BindableShape> {
    if selected.len() > config.suggestion_selection_limit {
        debug!(
            selected = selected.len(),
            limit = config.suggestion_selection_limit,
            "binding suggestions skipped for large selection"
        );
        return Vec::new();
    }
    let mut suggestions: Vec<BindableShape> = Vec::new();
    for arrow_id in selected {
        for shape in original_bindings_if_still_close(scene, arrow_id).into_iter().flatten() {
            if !selected.contains(&shape.id) && !suggestions.iter().any(|s| s.id == shape.id) {
                suggestions.push(shape);
            }
        }
    }
    suggestions
}

/// Shape to highlight under a dragged arrow end at `p`.
#[must_use]
pub fn suggested_binding_at(
    scene: &Scene,
    config: &BindingConfig,
    p: Point,
    selected: &[ElementId],
    elbowed: bool,
) -> Option<BindableShape> {
    if selected.len() > config.suggestion_selection_limit {
        return None;
    }
    hovered_element_excluding(scene, p, elbowed, selected)
}
