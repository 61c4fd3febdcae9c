//! Engine facade: scene, configuration, selection, and the active gesture.
//!
//! The host feeds pointer events in world coordinates; every entry point
//! returns the [`Action`]s it produced so the host can persist changed
//! elements and surface routing failures.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::binding::{
    DuplicateMode, bind_or_unbind_linear_elements, fix_bindings_after_deletion, fix_bindings_after_duplication,
    maybe_bind_linear_element,
};
use crate::config::BindingConfig;
use crate::element::{BindableShape, EdgeEnd, Element, ElementId, ElementUpdate};
use crate::error::RouteError;
use crate::geom::{Bounds, Point, Vector};
use crate::hit;
use crate::index::{BindingIndex, BindingMismatch};
use crate::input::{InputState, Modifiers, ResizeAnchor};
use crate::linear::{self, PointMove};
use crate::route::RouteOptions;
use crate::scene::Scene;
use crate::transform;

/// Actions returned from engine entry points for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ElementCreated { id: ElementId },
    ElementUpdated { id: ElementId },
    ElementDeleted { id: ElementId },
    /// An elbow arrow kept its previous route because no path was found.
    RouteFailed { arrow_id: ElementId },
}

/// Core engine state.
#[derive(Default)]
pub struct EngineCore {
    pub scene: Scene,
    pub config: BindingConfig,
    pub selection: Vec<ElementId>,
    pub input: InputState,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: BindingConfig) -> Self {
        Self { config, ..Self::default() }
    }

    // --- Data inputs ---

    /// Replace the whole scene. Selection and gesture are reset.
    pub fn load_snapshot(&mut self, elements: Vec<Element>) {
        self.scene = Scene::from_elements(elements);
        self.selection.clear();
        self.input = InputState::Idle;
    }

    /// Insert or replace one element.
    pub fn apply_create(&mut self, element: Element) {
        self.scene.insert(element);
    }

    // --- Selection ---

    /// Select the given elements; unknown and deleted ids are dropped.
    pub fn set_selection(&mut self, ids: &[ElementId]) {
        self.selection = ids.iter().filter(|id| self.scene.get_non_deleted(id).is_some()).copied().collect();
    }

    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    // --- Gestures ---

    /// Start moving the selection. Returns false when nothing is selected.
    pub fn begin_drag(&mut self, world: Point) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.input = InputState::DraggingSelection { last_world: world };
        true
    }

    /// Start dragging points of one line or arrow.
    pub fn begin_point_drag(&mut self, id: ElementId, indices: Vec<usize>, world: Point) -> bool {
        let Some(linear) = self.scene.get_non_deleted(&id).and_then(Element::as_linear) else {
            return false;
        };
        if indices.is_empty() || indices.iter().any(|i| *i >= linear.points.len()) {
            return false;
        }
        self.input = InputState::DraggingPoints { id, indices, last_world: world };
        true
    }

    /// Start resizing the selection from `anchor`.
    pub fn begin_resize(&mut self, anchor: ResizeAnchor) -> bool {
        let originals: Vec<Element> =
            self.selection.iter().filter_map(|id| self.scene.get_non_deleted(id)).cloned().collect();
        let Some(orig_bounds) = Bounds::common(originals.iter().filter_map(|el| self.scene.element_bounds(&el.id)))
        else {
            return false;
        };
        self.input = InputState::Resizing { anchor, orig_bounds, originals };
        true
    }

    /// Start rotating the selection with the pointer at `world`.
    pub fn begin_rotate(&mut self, world: Point) -> bool {
        let center = match self.selection.as_slice() {
            [id] => self.scene.get_non_deleted(id).map(linear::element_center),
            ids => Bounds::common(ids.iter().filter_map(|id| self.scene.element_bounds(id))).map(|b| b.center()),
        };
        let Some(center) = center else {
            return false;
        };
        let start_angle = (world.y - center.y).atan2(world.x - center.x);
        self.input = InputState::Rotating { center, start_angle, applied: 0.0 };
        true
    }

    /// Advance the active gesture to `world`.
    pub fn on_pointer_move(&mut self, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let before = self.versions();
        let state = std::mem::take(&mut self.input);
        let (next, errors) = match state {
            InputState::Idle => (InputState::Idle, Vec::new()),
            InputState::DraggingSelection { last_world } => {
                let errors =
                    transform::drag_selected_elements(&mut self.scene, &self.config, &self.selection, world - last_world);
                (InputState::DraggingSelection { last_world: world }, errors)
            }
            InputState::DraggingPoints { id, indices, last_world } => {
                let errors = self.drag_points(&id, &indices, world - last_world);
                (InputState::DraggingPoints { id, indices, last_world: world }, errors)
            }
            InputState::Resizing { anchor, orig_bounds, originals } => {
                let errors = match originals.as_slice() {
                    [orig] => transform::resize_single(&mut self.scene, &self.config, orig, anchor, world, modifiers),
                    many => transform::resize_multiple(
                        &mut self.scene,
                        &self.config,
                        many,
                        orig_bounds,
                        anchor,
                        world,
                        modifiers,
                    ),
                };
                (InputState::Resizing { anchor, orig_bounds, originals }, errors)
            }
            InputState::Rotating { center, start_angle, applied } => {
                let (applied, errors) = self.rotate(center, start_angle, applied, world, modifiers);
                (InputState::Rotating { center, start_angle, applied }, errors)
            }
        };
        self.input = next;
        self.actions_since(&before, errors)
    }

    /// Finish the active gesture and settle arrow bindings.
    pub fn on_pointer_up(&mut self, modifiers: Modifiers) -> Vec<Action> {
        let before = self.versions();
        let state = std::mem::take(&mut self.input);
        let binding_enabled = modifiers.binding_enabled();
        let errors = match state {
            InputState::Idle => Vec::new(),
            InputState::DraggingPoints { id, indices, .. } => bind_or_unbind_linear_elements(
                &mut self.scene,
                &self.config,
                &[id],
                binding_enabled,
                Some(&indices),
            ),
            InputState::DraggingSelection { .. } | InputState::Resizing { .. } | InputState::Rotating { .. } => {
                let arrows: Vec<ElementId> = self
                    .selection
                    .iter()
                    .filter(|id| self.scene.get_non_deleted(id).is_some_and(Element::is_arrow))
                    .copied()
                    .collect();
                bind_or_unbind_linear_elements(&mut self.scene, &self.config, &arrows, binding_enabled, None)
            }
        };
        debug!(binding_enabled, failures = errors.len(), "gesture finished");
        self.actions_since(&before, errors)
    }

    fn drag_points(&mut self, id: &ElementId, indices: &[usize], delta: Vector) -> Vec<RouteError> {
        let Some(el) = self.scene.get_non_deleted(id) else {
            return Vec::new();
        };
        let targets: Vec<PointMove> = indices
            .iter()
            .filter_map(|index| {
                let global = linear::point_at_index_global(el, *index)?;
                Some(PointMove { index: *index, point: linear::point_from_absolute(el, global.translate(delta)) })
            })
            .collect();
        let options = RouteOptions { dragging: el.is_elbow_arrow() };
        match linear::move_points(&mut self.scene, &self.config, id, &targets, ElementUpdate::default(), options) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        }
    }

    fn rotate(
        &mut self,
        center: Point,
        start_angle: f64,
        applied: f64,
        world: Point,
        modifiers: Modifiers,
    ) -> (f64, Vec<RouteError>) {
        if let [id] = self.selection.as_slice() {
            let id = *id;
            return (applied, transform::rotate_single(&mut self.scene, &self.config, &id, world, modifiers));
        }
        let mut total = (world.y - center.y).atan2(world.x - center.x) - start_angle;
        let step = self.config.rotation_snap_radians();
        if modifiers.shift && step > 0.0 {
            total = (total / step).round() * step;
        }
        let errors = transform::rotate_multiple(&mut self.scene, &self.config, &self.selection, center, total - applied);
        (total, errors)
    }

    // --- Arrows ---

    /// Bind a freshly drawn arrow: its start to `start_shape`, its end to the
    /// shape under `pointer`.
    pub fn finish_arrow(&mut self, arrow_id: &ElementId, start_shape: Option<ElementId>, pointer: Point) -> Vec<Action> {
        let before = self.versions();
        let errors = match maybe_bind_linear_element(&mut self.scene, &self.config, arrow_id, start_shape, pointer) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        };
        self.actions_since(&before, errors)
    }

    // --- Structural edits ---

    /// Tombstone elements and repair every binding that referenced them.
    pub fn delete_elements(&mut self, ids: &[ElementId]) -> Vec<Action> {
        let before = self.versions();
        let tombstone = ElementUpdate { is_deleted: Some(true), ..ElementUpdate::default() };
        let mut deleted = Vec::new();
        for id in ids {
            if self.scene.get_non_deleted(id).is_some() && self.scene.mutate(id, &tombstone) {
                deleted.push(*id);
            }
        }
        fix_bindings_after_deletion(&mut self.scene, &deleted);
        self.selection.retain(|id| !deleted.contains(id));
        debug!(count = deleted.len(), "elements deleted");
        self.actions_since(&before, Vec::new())
    }

    /// Clone elements under fresh ids and rewire bindings between them.
    ///
    /// In [`DuplicateMode::Normal`] the copies become the selection; with
    /// [`DuplicateMode::DuplicatesServeAsOld`] the originals stay selected.
    /// Returns the old to new id map with the actions.
    pub fn duplicate_elements(
        &mut self,
        ids: &[ElementId],
        mode: DuplicateMode,
    ) -> (HashMap<ElementId, ElementId>, Vec<Action>) {
        let before = self.versions();
        let originals: Vec<Element> = ids.iter().filter_map(|id| self.scene.get_non_deleted(id)).cloned().collect();
        let mut z_index = self.scene.next_z_index();
        let mut id_map = HashMap::new();
        for orig in &originals {
            let copy = orig.clone().with_id(ElementId::new_v4()).with_z_index(z_index);
            z_index += 1;
            id_map.insert(orig.id, copy.id);
            self.scene.insert(copy);
        }
        let old_ids: Vec<ElementId> = originals.iter().map(|el| el.id).collect();
        fix_bindings_after_duplication(&mut self.scene, &old_ids, &id_map, mode);
        if mode == DuplicateMode::Normal {
            self.selection = old_ids.iter().filter_map(|id| id_map.get(id)).copied().collect();
        }
        let actions = self.actions_since(&before, Vec::new());
        (id_map, actions)
    }

    // --- Queries ---

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.scene.get(id)
    }

    /// Shapes to highlight for the active gesture.
    ///
    /// While arrow ends are dragged these are the shapes under the dragged
    /// ends; otherwise the shapes the selected arrows are still bound close to.
    #[must_use]
    pub fn suggested_bindings(&self) -> Vec<BindableShape> {
        if let InputState::DraggingPoints { id, indices, .. } = &self.input {
            let Some(el) = self.scene.get_non_deleted(id) else {
                return Vec::new();
            };
            let Some(linear) = el.as_arrow() else {
                return Vec::new();
            };
            return [EdgeEnd::Start, EdgeEnd::End]
                .into_iter()
                .filter_map(|end| linear.end_index(end))
                .filter(|index| indices.contains(index))
                .filter_map(|index| linear::point_at_index_global(el, index))
                .filter_map(|p| hit::suggested_binding_at(&self.scene, &self.config, p, &[*id], linear.elbowed))
                .collect();
        }
        hit::suggested_bindings(&self.scene, &self.config, &self.selection)
    }

    /// Every disagreement between arrow bindings and shape back-references.
    #[must_use]
    pub fn audit(&self) -> Vec<BindingMismatch> {
        BindingIndex::from_scene(&self.scene).audit(&self.scene)
    }

    // --- Change tracking ---

    fn versions(&self) -> HashMap<ElementId, (u32, bool)> {
        self.scene.elements().map(|el| (el.id, (el.version, el.is_deleted))).collect()
    }

    fn actions_since(&self, before: &HashMap<ElementId, (u32, bool)>, errors: Vec<RouteError>) -> Vec<Action> {
        let mut changed: Vec<&Element> = self
            .scene
            .elements()
            .filter(|el| before.get(&el.id).is_none_or(|(version, _)| *version != el.version))
            .collect();
        changed.sort_by_key(|el| el.id);

        let mut actions: Vec<Action> = changed
            .into_iter()
            .map(|el| match before.get(&el.id) {
                None => Action::ElementCreated { id: el.id },
                Some((_, was_deleted)) if el.is_deleted && !was_deleted => Action::ElementDeleted { id: el.id },
                Some(_) => Action::ElementUpdated { id: el.id },
            })
            .collect();

        let mut failed: Vec<ElementId> = errors.iter().map(RouteError::arrow_id).collect();
        failed.sort();
        failed.dedup();
        for arrow_id in failed {
            warn!(%arrow_id, "elbow arrow left on its previous route");
            actions.push(Action::RouteFailed { arrow_id });
        }
        actions
    }
}
