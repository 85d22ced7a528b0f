//! Annotation model: shape kinds, their capability table, and the mirror store.
//!
//! This module defines what can be drawn over the scene (`ShapeKind`), the
//! single table of per-kind behaviour the rest of the engine branches on
//! (`Capabilities`), the annotation record the host hands the engine
//! (`Annotation`), and the in-memory mirror of live annotations
//! (`AnnotationStore`).
//!
//! The application state store owns the persisted geometry. The host hydrates
//! this mirror from it and forwards create/update/delete notifications, so the
//! engine can read an object's live positions when it becomes selected or
//! hovered.

#[cfg(test)]
#[path = "annotation_test.rs"]
mod annotation_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::POSITION_EPSILON;
use crate::geo::{Vec3, centroid};

/// Unique identifier for an annotation.
pub type ObjectId = Uuid;

/// The kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Single-position marker pin.
    Marker,
    /// Single-position text annotation.
    Label,
    /// Open path through two or more vertices.
    Polyline,
    /// Closed loop through three or more vertices.
    Polygon,
    /// Oriented 3D model placed at a single position.
    Model,
}

/// Per-kind behaviour. Every kind-dependent branch in the engine is a lookup here.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Vertices required before the shape may be completed.
    pub min_vertices: usize,
    /// Whether drawing collects several clicks before completion.
    pub needs_drawing_setup: bool,
    /// Whether the whole object moves when dragged.
    pub is_rigid_body: bool,
    /// Whether an edge joins the last vertex back to the first.
    pub is_closed_loop: bool,
    /// Whether corner and insert handles are built on selection.
    pub vertex_editable: bool,
    /// Whether a rotation/radius handle is built on selection.
    pub rotatable: bool,
    /// Whether each vertex carries a sampled elevation.
    pub samples_elevation: bool,
    /// Whether the kind has editable text.
    pub has_text: bool,
}

impl ShapeKind {
    pub const ALL: [Self; 5] = [Self::Marker, Self::Label, Self::Polyline, Self::Polygon, Self::Model];

    /// Capability table entry for this kind.
    #[must_use]
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Marker => Capabilities {
                min_vertices: 1,
                needs_drawing_setup: false,
                is_rigid_body: true,
                is_closed_loop: false,
                vertex_editable: false,
                rotatable: false,
                samples_elevation: true,
                has_text: true,
            },
            Self::Label => Capabilities {
                min_vertices: 1,
                needs_drawing_setup: false,
                is_rigid_body: true,
                is_closed_loop: false,
                vertex_editable: false,
                rotatable: false,
                samples_elevation: false,
                has_text: true,
            },
            Self::Polyline => Capabilities {
                min_vertices: 2,
                needs_drawing_setup: true,
                is_rigid_body: false,
                is_closed_loop: false,
                vertex_editable: true,
                rotatable: false,
                samples_elevation: true,
                has_text: true,
            },
            Self::Polygon => Capabilities {
                min_vertices: 3,
                needs_drawing_setup: true,
                is_rigid_body: false,
                is_closed_loop: true,
                vertex_editable: true,
                rotatable: false,
                samples_elevation: true,
                has_text: true,
            },
            Self::Model => Capabilities {
                min_vertices: 1,
                needs_drawing_setup: false,
                is_rigid_body: true,
                is_closed_loop: false,
                vertex_editable: false,
                rotatable: true,
                samples_elevation: false,
                has_text: false,
            },
        }
    }

    /// Kinds reported to listeners as a special selection category.
    #[must_use]
    pub fn is_special_category(self) -> bool {
        self.capabilities().rotatable
    }
}

/// An annotation as mirrored from the application state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier.
    pub id: ObjectId,
    /// Shape kind.
    pub kind: ShapeKind,
    /// World positions. Closed loops may repeat the first vertex at the end.
    pub positions: Vec<Vec3>,
    /// Heading in radians clockwise from north (oriented kinds only).
    #[serde(default)]
    pub heading: f64,
    /// Bounding-sphere radius in world units (oriented kinds only).
    #[serde(default)]
    pub radius: f64,
    /// Display title.
    #[serde(default)]
    pub title: String,
}

impl Annotation {
    #[must_use]
    pub fn new(id: ObjectId, kind: ShapeKind, positions: Vec<Vec3>) -> Self {
        Self { id, kind, positions, heading: 0.0, radius: 0.0, title: String::new() }
    }

    /// Current editable vertex list.
    ///
    /// Single-position kinds yield one vertex; closed loops drop a duplicated
    /// closing vertex.
    #[must_use]
    pub fn vertices(&self) -> Vec<Vec3> {
        let caps = self.kind.capabilities();
        if !caps.needs_drawing_setup {
            return self.positions.first().copied().into_iter().collect();
        }
        let mut out = self.positions.clone();
        if caps.is_closed_loop && out.len() > 1 {
            if let (Some(first), Some(last)) = (out.first(), out.last()) {
                if first.approx_eq(*last, POSITION_EPSILON) {
                    out.pop();
                }
            }
        }
        out
    }

    /// World anchor for the title label.
    ///
    /// Points use their position, open paths the midpoint of their middle
    /// segment, closed loops their centroid.
    #[must_use]
    pub fn title_anchor(kind: ShapeKind, vertices: &[Vec3]) -> Option<Vec3> {
        let caps = kind.capabilities();
        match vertices {
            [] => None,
            [only] => Some(*only),
            _ if caps.is_closed_loop => centroid(vertices),
            _ => {
                let mid = (vertices.len() - 1) / 2;
                Some(vertices[mid].midpoint(vertices[mid + 1]))
            }
        }
    }
}

/// Edges of a vertex list as index pairs. Closed loops include last-to-first.
#[must_use]
pub fn edges(vertex_count: usize, closed: bool) -> Vec<(usize, usize)> {
    if vertex_count < 2 {
        return Vec::new();
    }
    let mut out: Vec<(usize, usize)> = (0..vertex_count - 1).map(|i| (i, i + 1)).collect();
    if closed && vertex_count > 2 {
        out.push((vertex_count - 1, 0));
    }
    out
}

/// In-memory mirror of live annotations.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    objects: HashMap<ObjectId, Annotation>,
}

impl AnnotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all annotations with a fresh snapshot.
    pub fn load_snapshot(&mut self, annotations: Vec<Annotation>) {
        self.objects = annotations.into_iter().map(|a| (a.id, a)).collect();
    }

    /// Insert or replace an annotation.
    pub fn insert(&mut self, annotation: Annotation) {
        self.objects.insert(annotation.id, annotation);
    }

    /// Remove an annotation, returning it if present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<Annotation> {
        self.objects.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&Annotation> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut Annotation> {
        self.objects.get_mut(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
