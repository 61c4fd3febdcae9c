//! In-memory element store.
//!
//! The scene owns every element, including tombstoned ones. Callers read
//! through shared references and write only through [`Scene::mutate`], which
//! applies an [`ElementUpdate`] and bumps the element's version. Absolute
//! bounds are memoized per `(id, version)`, so any mutation invalidates the
//! cached entry without explicit bookkeeping.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::element::{BindableShape, Element, ElementId, ElementUpdate};
use crate::geom::Bounds;
use crate::linear;

pub struct Scene {
    elements: HashMap<ElementId, Element>,
    bounds_memo: RefCell<HashMap<ElementId, (u32, Bounds)>>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self { elements: HashMap::new(), bounds_memo: RefCell::new(HashMap::new()) }
    }

    /// Build a scene from a list of elements.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut scene = Self::new();
        for element in elements {
            scene.insert(element);
        }
        scene
    }

    /// Insert or replace an element.
    pub fn insert(&mut self, element: Element) {
        self.bounds_memo.borrow_mut().remove(&element.id);
        self.elements.insert(element.id, element);
    }

    /// Remove an element outright, returning it if it was present.
    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        self.bounds_memo.borrow_mut().remove(id);
        self.elements.remove(id)
    }

    /// Any element by id, tombstoned or not.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// A live element by id.
    #[must_use]
    pub fn get_non_deleted(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id).filter(|el| !el.is_deleted)
    }

    /// Geometry snapshot of a live bindable shape.
    #[must_use]
    pub fn bindable(&self, id: &ElementId) -> Option<BindableShape> {
        self.get_non_deleted(id).and_then(Element::as_bindable)
    }

    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Apply a sparse update and bump the version. Returns false if the element doesn't exist.
    ///
    /// Point updates also refresh a linear element's width and height.
    /// Binding fields are ignored on elements without a linear payload.
    pub fn mutate(&mut self, id: &ElementId, update: &ElementUpdate) -> bool {
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        if let Some(x) = update.x {
            el.x = x;
        }
        if let Some(y) = update.y {
            el.y = y;
        }
        if let Some(w) = update.width {
            el.width = w;
        }
        if let Some(h) = update.height {
            el.height = h;
        }
        if let Some(a) = update.angle {
            el.angle = a;
        }
        if let Some(deleted) = update.is_deleted {
            el.is_deleted = deleted;
        }
        if let Some(ref bound) = update.bound_elements {
            el.bound_elements.clone_from(bound);
        }
        if let Some(linear) = el.as_linear_mut() {
            if let Some(ref points) = update.points {
                linear.points.clone_from(points);
            }
            if let Some(start) = update.start_binding {
                linear.start_binding = start;
            }
            if let Some(end) = update.end_binding {
                linear.end_binding = end;
            }
        }
        if update.points.is_some() {
            el.sync_linear_size();
        }
        el.version = el.version.wrapping_add(1);
        true
    }

    /// Every element, tombstones included, in no particular order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Live elements sorted by `(z_index, id)`, bottom first.
    #[must_use]
    pub fn sorted_elements(&self) -> Vec<&Element> {
        let mut els: Vec<&Element> = self.elements.values().filter(|el| !el.is_deleted).collect();
        els.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        els
    }

    /// Ids of live arrows, sorted for deterministic iteration.
    #[must_use]
    pub fn arrow_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> =
            self.elements.values().filter(|el| !el.is_deleted && el.is_arrow()).map(|el| el.id).collect();
        ids.sort();
        ids
    }

    /// One above the highest z-index in the scene.
    #[must_use]
    pub fn next_z_index(&self) -> i64 {
        self.elements.values().map(|el| el.z_index).max().map_or(0, |z| z + 1)
    }

    /// Absolute axis-aligned bounds, memoized per `(id, version)`.
    #[must_use]
    pub fn element_bounds(&self, id: &ElementId) -> Option<Bounds> {
        let el = self.elements.get(id)?;
        if let Some((version, bounds)) = self.bounds_memo.borrow().get(id) {
            if *version == el.version {
                return Some(*bounds);
            }
        }
        let bounds = linear::element_bounds(el);
        self.bounds_memo.borrow_mut().insert(*id, (el.version, bounds));
        Some(bounds)
    }

    /// Number of memoized bounds entries.
    #[must_use]
    pub fn memoized_bounds(&self) -> usize {
        self.bounds_memo.borrow().len()
    }

    /// Number of elements currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the store contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
