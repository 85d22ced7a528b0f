//! Input model: pointer buttons, drawing and drag state, and the shared interaction state.
//!
//! `InteractionState` is the single mutable state the router, the drawing
//! machine, the selection lifecycle and the drag engine all operate on.
//! Transient gesture context lives in `DrawingState` and `DragSession` so it
//! is dropped wholesale when the gesture ends and cannot leak into the next
//! object.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::annotation::{ObjectId, ShapeKind};
use crate::geo::{ScreenPoint, Vec3};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Drawing state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawingState {
    /// Not drawing.
    #[default]
    Idle,
    /// Collecting vertices for a new shape.
    Collecting {
        kind: ShapeKind,
        /// Vertices placed so far, in click order.
        vertices: Vec<Vec3>,
    },
}

impl DrawingState {
    #[must_use]
    pub fn kind(&self) -> Option<ShapeKind> {
        match self {
            Self::Idle => None,
            Self::Collecting { kind, .. } => Some(*kind),
        }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        match self {
            Self::Idle => &[],
            Self::Collecting { vertices, .. } => vertices,
        }
    }
}

/// What a pointer-down grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// An insert handle on the edge starting at `edge`.
    InsertHandle { object_id: ObjectId, edge: usize },
    /// The rotation/radius handle of an oriented object.
    Rotation { object_id: ObjectId },
    /// A rigid-body object as a whole.
    Object { object_id: ObjectId },
    /// One corner handle.
    Vertex { object_id: ObjectId, index: usize },
}

impl DragTarget {
    #[must_use]
    pub fn object_id(self) -> ObjectId {
        match self {
            Self::InsertHandle { object_id, .. }
            | Self::Rotation { object_id }
            | Self::Object { object_id }
            | Self::Vertex { object_id, .. } => object_id,
        }
    }
}

/// Context of an active drag, from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub target: DragTarget,
    /// Selected vertex 0 minus the pointer's world position at pointer-down.
    pub offset: Vec3,
    /// Latest pointer world position; `None` until the pointer moves.
    pub live_point: Option<Vec3>,
    /// Pointer azimuth at pointer-down (rotation drags).
    pub start_angle: f64,
    /// Live pointer azimuth (rotation drags).
    pub angle: f64,
    /// Object heading at pointer-down (rotation drags).
    pub start_heading: f64,
    /// Rotation since pointer-down, summed over moves so turns past half a revolution are kept.
    pub delta_angle: f64,
}

impl DragSession {
    #[must_use]
    pub fn new(target: DragTarget) -> Self {
        Self {
            target,
            offset: Vec3::ZERO,
            live_point: None,
            start_angle: 0.0,
            angle: 0.0,
            start_heading: 0.0,
            delta_angle: 0.0,
        }
    }
}

/// Shared interaction state, one per active scene.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// World position of the last resolved click.
    pub clicked_point: Option<Vec3>,
    /// Last pointer position on the canvas.
    pub mouse_screen: Option<ScreenPoint>,
    /// Last pointer position resolved to the world.
    pub mouse_position: Option<Vec3>,
    pub selected_object: Option<ObjectId>,
    pub hovered_object: Option<ObjectId>,
    pub drawing: DrawingState,
    /// Vertex snapshot of the selected object.
    pub selected_vertices: Vec<Vec3>,
    /// Vertex snapshot of the hovered object.
    pub hovered_vertices: Vec<Vec3>,
    pub drag: Option<DragSession>,
    /// Whether the live drawing point is snapped onto the first vertex.
    pub is_snapping: bool,
    /// Id assigned to a finished shape whose creation has not been observed yet.
    pub pending_select: Option<ObjectId>,
    /// Object to deselect once its committed update is observed.
    pub pending_deselect: Option<ObjectId>,
}

impl InteractionState {
    #[must_use]
    pub fn drawing_mode(&self) -> Option<ShapeKind> {
        self.drawing.kind()
    }

    #[must_use]
    pub fn drawn_vertices(&self) -> &[Vec3] {
        self.drawing.vertices()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn is_dragging_insert_handle(&self) -> bool {
        matches!(self.drag.as_ref().map(|d| d.target), Some(DragTarget::InsertHandle { .. }))
    }

    #[must_use]
    pub fn is_dragging_rotation(&self) -> bool {
        matches!(self.drag.as_ref().map(|d| d.target), Some(DragTarget::Rotation { .. }))
    }

    #[must_use]
    pub fn dragging_object(&self) -> Option<ObjectId> {
        self.drag.as_ref().map(|d| d.target.object_id())
    }

    /// Index of the vertex being dragged. Insert drags report the new vertex's index.
    #[must_use]
    pub fn editing_index(&self) -> Option<usize> {
        match self.drag.as_ref()?.target {
            DragTarget::Vertex { index, .. } => Some(index),
            DragTarget::InsertHandle { edge, .. } => Some(edge + 1),
            DragTarget::Object { .. } => Some(0),
            DragTarget::Rotation { .. } => None,
        }
    }

    /// Live pointer azimuth of a rotation drag.
    #[must_use]
    pub fn drag_angle(&self) -> Option<f64> {
        self.drag.as_ref().filter(|d| matches!(d.target, DragTarget::Rotation { .. })).map(|d| d.angle)
    }
}
