//! Interaction engine: input routing, rendered precedence and lifecycle.
//!
//! DESIGN
//! ======
//! `InteractionEngine` owns the shared `InteractionState`, the editing
//! handle layer, the sample cache and the overlay bookkeeping. Raw pointer
//! events enter through the `on_*` handlers and are routed to the drawing
//! machine (`drawing.rs`), the selection lifecycle (`selection.rs`) or the
//! drag engine (`drag.rs`). Results leave as events on `events`.
//!
//! Every handler first checks that the rendering surface is still alive and
//! silently returns if it is not; teardown can race pending callbacks.
//!
//! Object creation after a finished drawing, and the commit of a rotation
//! drag, are observed through `on_object_created` / `on_object_updated`
//! instead of timers: the engine records what it is waiting for and reacts
//! when the host reports it.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::annotation::{Annotation, AnnotationStore, ObjectId, ShapeKind};
use crate::cache::{CacheKey, SampleCache, SampleOutcome};
use crate::config::EngineConfig;
use crate::drawing::preview_vertices;
use crate::error::{EngineError, SampleError};
use crate::events::{EngineEvents, MouseMoved, ObjectClicked};
use crate::geo::{Geometry, ScreenPoint, Vec3};
use crate::handles::{HandleId, HandleLayer, HandleRole};
use crate::input::{Button, DragTarget, InteractionState};
use crate::overlay::{OverlayHost, OverlayState};
use crate::scene::{Picked, Scene};

/// Which state drives the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderedSource {
    Drawing,
    Dragging,
    Selected,
    Hovered,
    None,
}

/// Vertex set and identity currently authoritative for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub source: RenderedSource,
    pub object_id: Option<ObjectId>,
    pub kind: Option<ShapeKind>,
    pub vertices: Vec<Vec3>,
}

impl Rendered {
    fn empty() -> Self {
        Self { source: RenderedSource::None, object_id: None, kind: None, vertices: Vec::new() }
    }
}

pub struct InteractionEngine<S: Scene, O: OverlayHost> {
    pub(crate) scene: S,
    pub(crate) overlays: O,
    pub(crate) geometry: Box<dyn Geometry>,
    pub(crate) config: EngineConfig,
    pub(crate) store: AnnotationStore,
    pub(crate) state: InteractionState,
    pub(crate) handles: HandleLayer,
    pub(crate) cache: SampleCache,
    pub(crate) overlay: OverlayState,
    /// Ids of the drawing preview and confirmation entities in the scene.
    pub(crate) drawing_entities: Vec<String>,
    destroyed: bool,
    pub events: EngineEvents,
}

impl<S: Scene, O: OverlayHost> InteractionEngine<S, O> {
    /// Bind an engine to a rendering surface and overlay container.
    ///
    /// # Errors
    ///
    /// Fails fast when the configuration is invalid, the surface is already
    /// destroyed, the scene has no handle layer, or the overlay container is
    /// missing.
    pub fn new(scene: S, overlays: O, geometry: Box<dyn Geometry>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if scene.is_destroyed() {
            return Err(EngineError::SceneDestroyed);
        }
        if !scene.has_handle_layer() {
            return Err(EngineError::MissingHandleLayer);
        }
        if !overlays.has_container() {
            return Err(EngineError::MissingOverlayContainer);
        }
        tracing::debug!("interaction engine created");
        Ok(Self {
            scene,
            overlays,
            geometry,
            config,
            store: AnnotationStore::new(),
            state: InteractionState::default(),
            handles: HandleLayer::new(),
            cache: SampleCache::new(),
            overlay: OverlayState::default(),
            drawing_entities: Vec::new(),
            destroyed: false,
            events: EngineEvents::default(),
        })
    }

    /// Whether handlers should run.
    pub(crate) fn is_live(&self) -> bool {
        !self.destroyed && !self.scene.is_destroyed()
    }

    // --- Data inputs ---

    /// Hydrate the annotation mirror. Selection and hover on vanished objects are dropped.
    pub fn load_snapshot(&mut self, annotations: Vec<Annotation>) {
        self.store.load_snapshot(annotations);
        if let Some(id) = self.state.selected_object {
            if self.store.get(&id).is_none() {
                self.select(None);
            }
        }
        if let Some(id) = self.state.hovered_object {
            if self.store.get(&id).is_none() {
                self.hover(None);
            }
        }
    }

    /// The host created an annotation. Selects it if it carries the id handed
    /// out with the last `drawing_finished` event.
    pub fn on_object_created(&mut self, annotation: Annotation) {
        let id = annotation.id;
        self.store.insert(annotation);
        if self.state.pending_select == Some(id) {
            self.state.pending_select = None;
            tracing::debug!(object = %id, "selecting newly drawn object");
            self.select(Some(id));
        }
    }

    /// The host updated an annotation (including acknowledging a commit).
    pub fn on_object_updated(&mut self, annotation: Annotation) {
        let id = annotation.id;
        self.store.insert(annotation);
        if self.state.pending_deselect == Some(id) {
            self.state.pending_deselect = None;
            self.select(None);
            return;
        }
        if self.state.dragging_object() == Some(id) {
            return;
        }
        if self.state.selected_object == Some(id) {
            self.refresh_selection();
        }
        if self.state.hovered_object == Some(id) {
            if let Some(a) = self.store.get(&id) {
                self.state.hovered_vertices = a.vertices();
            }
        }
    }

    /// The host deleted an annotation.
    pub fn on_object_deleted(&mut self, id: &ObjectId) {
        if self.state.selected_object == Some(*id) {
            self.cancel_drag();
            self.select(None);
        }
        if self.state.hovered_object == Some(*id) {
            self.hover(None);
        }
        if self.state.pending_deselect == Some(*id) {
            self.state.pending_deselect = None;
        }
        self.store.remove(id);
    }

    /// Push an asynchronously fetched sample (elevation) for a vertex.
    pub fn apply_sample(&mut self, key: CacheKey, index: usize, result: Result<f64, SampleError>) -> SampleOutcome {
        if !self.is_live() {
            return SampleOutcome::NotOpen;
        }
        self.cache.apply(key, index, result)
    }

    // --- Input events ---

    pub fn on_click(&mut self, screen: ScreenPoint, button: Button) {
        if !self.is_live() || button != Button::Primary {
            return;
        }
        let world = self.scene.pick_position(screen);
        if let Some(kind) = self.state.drawing_mode() {
            let Some(point) = world else {
                return;
            };
            self.state.clicked_point = Some(point);
            self.drawing_click(kind, screen, point);
            return;
        }
        if world.is_some() {
            self.state.clicked_point = world;
        }
        match self.scene.pick(screen) {
            Some(Picked::Entity(id)) if HandleId::parse(&id).is_some() => {}
            Some(Picked::Annotation(id)) => {
                self.events.object_clicked.emit(&ObjectClicked { object_id: id });
                self.select(Some(id));
            }
            _ => self.select(None),
        }
    }

    pub fn on_pointer_down(&mut self, screen: ScreenPoint, button: Button) {
        if !self.is_live() || button != Button::Primary || self.state.drawing_mode().is_some() {
            return;
        }
        let picks = self.scene.drill_pick(screen);
        let Some(target) = self.resolve_drag_target(&picks) else {
            return;
        };
        let world = self.scene.pick_position(screen);
        self.start_drag(target, world);
    }

    pub fn on_pointer_up(&mut self, _screen: ScreenPoint, button: Button) {
        if !self.is_live() || button != Button::Primary {
            return;
        }
        if self.state.is_dragging() {
            self.end_drag();
        }
    }

    pub fn on_pointer_move(&mut self, screen: ScreenPoint) {
        if !self.is_live() {
            return;
        }
        self.state.mouse_screen = Some(screen);
        let world = self.scene.pick_position(screen);
        if let Some(position) = world {
            self.state.mouse_position = Some(position);
            self.events.mouse_moved.emit(&MouseMoved { position });
        }
        self.update_snapping();

        if self.state.is_dragging() {
            self.update_drag(world);
            return;
        }
        if self.scene.is_camera_moving() || self.state.drawing_mode().is_some() {
            return;
        }
        if self.state.selected_object.is_some() {
            return;
        }
        match self.scene.pick(screen) {
            Some(Picked::Annotation(id)) => self.hover(Some(id)),
            _ => self.hover(None),
        }
    }

    /// Pick the drag target under the pointer.
    ///
    /// Priority: insert handle, rotation handle, rigid-body object, corner handle.
    fn resolve_drag_target(&self, picks: &[Picked]) -> Option<DragTarget> {
        let selected = self.state.selected_object;
        let handles: Vec<HandleId> = picks
            .iter()
            .filter_map(|p| match p {
                Picked::Entity(id) => HandleId::parse(id),
                _ => None,
            })
            .filter(|h| Some(h.object_id) == selected && self.handles.contains(h))
            .collect();
        let find = |role: HandleRole| handles.iter().find(|h| h.role == role).copied();

        if let Some(h) = find(HandleRole::Insert) {
            return Some(DragTarget::InsertHandle { object_id: h.object_id, edge: h.index });
        }
        if let Some(h) = find(HandleRole::Rotation) {
            return Some(DragTarget::Rotation { object_id: h.object_id });
        }
        let rigid = picks.iter().find_map(|p| match p {
            Picked::Annotation(id) => self
                .store
                .get(id)
                .filter(|a| a.kind.capabilities().is_rigid_body)
                .map(|a| a.id),
            _ => None,
        });
        if let Some(object_id) = rigid {
            return Some(DragTarget::Object { object_id });
        }
        find(HandleRole::Corner).map(|h| DragTarget::Vertex { object_id: h.object_id, index: h.index })
    }

    // --- Rendered precedence ---

    /// Vertex set to display: drawing preview, else live drag, else selection, else hover.
    #[must_use]
    pub fn rendered(&self) -> Rendered {
        if let Some(kind) = self.state.drawing_mode() {
            return Rendered {
                source: RenderedSource::Drawing,
                object_id: None,
                kind: Some(kind),
                vertices: preview_vertices(
                    self.state.drawn_vertices(),
                    self.state.mouse_position,
                    self.state.is_snapping,
                ),
            };
        }
        let kind_of = |id: ObjectId| self.store.get(&id).map(|a| a.kind);
        if let Some(id) = self.state.dragging_object() {
            return Rendered {
                source: RenderedSource::Dragging,
                object_id: Some(id),
                kind: kind_of(id),
                vertices: self.editing_locations(),
            };
        }
        if let Some(id) = self.state.selected_object {
            return Rendered {
                source: RenderedSource::Selected,
                object_id: Some(id),
                kind: kind_of(id),
                vertices: self.state.selected_vertices.clone(),
            };
        }
        if let Some(id) = self.state.hovered_object {
            return Rendered {
                source: RenderedSource::Hovered,
                object_id: Some(id),
                kind: kind_of(id),
                vertices: self.state.hovered_vertices.clone(),
            };
        }
        Rendered::empty()
    }

    // --- Teardown ---

    /// Tear down previews, handles, overlays and camera locks. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let scene_alive = !self.scene.is_destroyed();
        if scene_alive {
            self.end_text_edit();
            self.remove_drawing_entities();
            self.handles.clear(&mut self.scene);
            self.scene.set_camera_controls_enabled(true);
        }
        self.teardown_overlays();
        self.cache.clear();
        self.state = InteractionState::default();
        self.destroyed = true;
        tracing::debug!("interaction engine destroyed");
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    #[must_use]
    pub fn handles(&self) -> &HandleLayer {
        &self.handles
    }

    #[must_use]
    pub fn cache(&self) -> &SampleCache {
        &self.cache
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[must_use]
    pub fn overlays(&self) -> &O {
        &self.overlays
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_overlay_shown(&self, kind: crate::overlay::OverlayKind) -> bool {
        self.overlay.visibility.is_shown(kind)
    }

    /// Duplicate handle creations swallowed so far.
    #[must_use]
    pub fn duplicate_handle_adds(&self) -> u64 {
        self.handles.duplicate_adds()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
