//! Arrow to shape adjacency.
//!
//! The bindings stored on arrows are the source of truth. [`BindingIndex`]
//! derives the reverse direction from them, and [`reconcile_bound_elements`]
//! rewrites the arrow entries of each shape's `bound_elements` so the two
//! views always agree. Non-arrow entries (bound text) are left alone.

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::element::{BoundElement, BoundKind, EdgeEnd, ElementId, ElementUpdate};
use crate::scene::Scene;

/// One detected disagreement between an arrow's bindings and a shape's
/// `bound_elements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindingMismatch {
    /// The arrow binds to the shape but the shape doesn't list the arrow.
    MissingBackReference { shape_id: ElementId, arrow_id: ElementId },
    /// The shape lists an arrow that doesn't bind to it.
    StaleBackReference { shape_id: ElementId, arrow_id: ElementId },
    /// The arrow binds to a shape that is missing, deleted, or not bindable.
    DanglingBinding { arrow_id: ElementId, end: EdgeEnd, shape_id: ElementId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingIndex {
    by_shape: BTreeMap<ElementId, BTreeSet<ElementId>>,
    by_arrow: BTreeMap<ElementId, [Option<ElementId>; 2]>,
}

impl BindingIndex {
    /// Index the bindings of every live arrow in the scene.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let mut index = Self::default();
        for arrow_id in scene.arrow_ids() {
            let Some(linear) = scene.get(&arrow_id).and_then(|el| el.as_arrow()) else {
                continue;
            };
            let ends = [EdgeEnd::Start, EdgeEnd::End].map(|end| linear.binding(end).map(|b| b.element_id));
            for shape_id in ends.iter().flatten() {
                index.by_shape.entry(*shape_id).or_default().insert(arrow_id);
            }
            if ends.iter().any(Option::is_some) {
                index.by_arrow.insert(arrow_id, ends);
            }
        }
        index
    }

    /// Live arrows with at least one end bound to `shape_id`, sorted.
    #[must_use]
    pub fn arrows_bound_to(&self, shape_id: &ElementId) -> Vec<ElementId> {
        self.by_shape.get(shape_id).map(|arrows| arrows.iter().copied().collect()).unwrap_or_default()
    }

    /// Shapes bound at `[start, end]` of `arrow_id`.
    #[must_use]
    pub fn shapes_of(&self, arrow_id: &ElementId) -> [Option<ElementId>; 2] {
        self.by_arrow.get(arrow_id).copied().unwrap_or_default()
    }

    /// Every shape referenced by at least one live arrow.
    pub fn bound_shapes(&self) -> impl Iterator<Item = &ElementId> {
        self.by_shape.keys()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_arrow.is_empty()
    }

    /// All disagreements between the index and the scene, sorted.
    #[must_use]
    pub fn audit(&self, scene: &Scene) -> Vec<BindingMismatch> {
        let mut issues = Vec::new();
        for (arrow_id, ends) in &self.by_arrow {
            for (end, shape_id) in [EdgeEnd::Start, EdgeEnd::End].into_iter().zip(ends) {
                let Some(shape_id) = shape_id else {
                    continue;
                };
                match scene.get_non_deleted(shape_id).filter(|el| el.as_bindable().is_some()) {
                    None => issues.push(BindingMismatch::DanglingBinding {
                        arrow_id: *arrow_id,
                        end,
                        shape_id: *shape_id,
                    }),
                    Some(shape) if !shape.has_bound_arrow(*arrow_id) => {
                        issues.push(BindingMismatch::MissingBackReference { shape_id: *shape_id, arrow_id: *arrow_id });
                    }
                    Some(_) => {}
                }
            }
        }
        for shape in scene.elements().filter(|el| !el.is_deleted && el.as_bindable().is_some()) {
            let expected = self.by_shape.get(&shape.id);
            for bound in shape.bound_elements.iter().filter(|b| b.kind == BoundKind::Arrow) {
                if !expected.is_some_and(|arrows| arrows.contains(&bound.id)) {
                    issues.push(BindingMismatch::StaleBackReference { shape_id: shape.id, arrow_id: bound.id });
                }
            }
        }
        issues.sort();
        issues.dedup();
        issues
    }
}

/// Rewrite the arrow entries of `bound_elements` on every shape in `shapes`
/// (or on every element when `None`) to match the arrows' bindings.
///
/// Existing entries keep their order; missing arrows are appended. Deleted
/// shapes end up with no arrow entries. Returns the number of shapes changed.
pub fn reconcile_bound_elements(scene: &mut Scene, shapes: Option<&[ElementId]>) -> usize {
    let index = BindingIndex::from_scene(scene);
    let targets: Vec<ElementId> = match shapes {
        Some(ids) => ids.to_vec(),
        None => {
            let mut ids: Vec<ElementId> = scene.elements().map(|el| el.id).collect();
            ids.sort();
            ids
        }
    };

    let mut changed = 0;
    for shape_id in targets {
        let Some(el) = scene.get(&shape_id) else {
            continue;
        };
        let expected: BTreeSet<ElementId> = if el.is_deleted || el.as_bindable().is_none() {
            BTreeSet::new()
        } else {
            index.arrows_bound_to(&shape_id).into_iter().collect()
        };

        let mut next: Vec<BoundElement> = el
            .bound_elements
            .iter()
            .filter(|b| b.kind != BoundKind::Arrow || expected.contains(&b.id))
            .copied()
            .collect();
        let mut seen: BTreeSet<ElementId> = BTreeSet::new();
        next.retain(|b| b.kind != BoundKind::Arrow || seen.insert(b.id));
        for arrow_id in &expected {
            if !seen.contains(arrow_id) {
                next.push(BoundElement::arrow(*arrow_id));
            }
        }

        if next != el.bound_elements {
            debug!(%shape_id, before = el.bound_elements.len(), after = next.len(), "bound elements reconciled");
            scene.mutate(&shape_id, &ElementUpdate::bound_elements(next));
            changed += 1;
        }
    }
    changed
}
