//! Named events published to presentation-layer listeners.
//!
//! Each event is an [`Observable`]: any number of independent listeners may
//! subscribe, and each stays registered until it is explicitly unsubscribed
//! with the [`ListenerId`] it was given.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::fmt;

use serde::Serialize;

use crate::annotation::{ObjectId, ShapeKind};
use crate::cache::CacheKey;
use crate::geo::Vec3;

/// Token returned by [`Observable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

/// A single-threaded event channel with add/remove-listener semantics.
pub struct Observable<T> {
    listeners: Vec<(ListenerId, Listener<T>)>,
    next_id: u64,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self { listeners: Vec::new(), next_id: 0 }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> Observable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It is called for every emitted event, in subscription order.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&T) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &T) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectClicked {
    pub object_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChanged {
    pub object_id: Option<ObjectId>,
    pub is_special_category: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverChanged {
    pub object_id: Option<ObjectId>,
}

/// Vertex or rigid-body drag progress. Emitted on start, on every move, and once on release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragChanged {
    pub object_id: ObjectId,
    pub is_dragging: bool,
    pub mouse: Option<Vec3>,
    /// Live edited vertices.
    pub vertices: Vec<Vec3>,
}

/// Rotation handle drag progress. Angles are radians clockwise from north.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationDragChanged {
    pub is_dragging: bool,
    pub object_id: ObjectId,
    pub angle: f64,
    pub delta_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MouseMoved {
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawingFinished {
    /// Id the host should give the created annotation. The engine selects the
    /// object when `on_object_created` reports this id.
    pub object_id: ObjectId,
    pub kind: ShapeKind,
    pub vertices: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexAdded {
    pub kind: ShapeKind,
    pub point: Vec3,
    pub index: usize,
}

/// Final geometry of a completed drag, for the application store to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryCommitted {
    pub object_id: ObjectId,
    pub positions: Vec<Vec3>,
    pub heading: f64,
}

/// The host should fetch a sample for `position` and push it back with `apply_sample`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRequested {
    pub key: CacheKey,
    pub index: usize,
    pub position: Vec3,
}

/// Every event the engine publishes.
#[derive(Debug, Default)]
pub struct EngineEvents {
    pub object_clicked: Observable<ObjectClicked>,
    pub selection_changed: Observable<SelectionChanged>,
    pub hover_changed: Observable<HoverChanged>,
    pub drag_changed: Observable<DragChanged>,
    pub rotation_drag_changed: Observable<RotationDragChanged>,
    pub mouse_moved: Observable<MouseMoved>,
    pub drawing_finished: Observable<DrawingFinished>,
    pub vertex_added: Observable<VertexAdded>,
    pub geometry_committed: Observable<GeometryCommitted>,
    pub sample_requested: Observable<SampleRequested>,
}
