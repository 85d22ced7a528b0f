//! Drawing state machine: vertex collection, snap-to-first-point, completion.
//!
//! `Idle -> Collecting` on `start_drawing`; `Collecting -> Idle` on
//! completion, `stop_drawing`, or a kind switch. Kinds without a drawing setup
//! complete on their first resolved click.

#[cfg(test)]
#[path = "drawing_test.rs"]
mod drawing_test;

use crate::annotation::{ObjectId, ShapeKind, edges};
use crate::cache::CacheKey;
use crate::engine::InteractionEngine;
use crate::events::{DrawingFinished, SampleRequested, VertexAdded};
use crate::geo::{Geometry, ScreenPoint, Vec3};
use crate::input::DrawingState;
use crate::overlay::{OverlayHost, OverlayKind, ShowReason};
use crate::scene::{EntityRole, Picked, Scene, SceneEntity};

pub const PREVIEW_ENTITY_ID: &str = "preview-drawing-0";
pub const CONFIRM_ENTITY_ID: &str = "confirm-drawing-0";

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Whether snapping to the first vertex may apply.
#[must_use]
pub fn snap_eligible(kind: ShapeKind, vertex_count: usize) -> bool {
    let caps = kind.capabilities();
    caps.is_closed_loop && vertex_count >= caps.min_vertices
}

/// Whether the pointer is within `threshold_px` of the first vertex on screen.
#[must_use]
pub fn within_snap(mouse: ScreenPoint, first: ScreenPoint, threshold_px: f64) -> bool {
    mouse.distance(first) <= threshold_px
}

/// The point the next click would add: the first vertex while snapping, else the pointer.
#[must_use]
pub fn virtual_next_point(vertices: &[Vec3], mouse: Option<Vec3>, snapping: bool) -> Option<Vec3> {
    if snapping {
        if let Some(first) = vertices.first() {
            return Some(*first);
        }
    }
    mouse
}

/// Drawn vertices followed by the virtual next point.
#[must_use]
pub fn preview_vertices(vertices: &[Vec3], mouse: Option<Vec3>, snapping: bool) -> Vec<Vec3> {
    let mut out = vertices.to_vec();
    out.extend(virtual_next_point(vertices, mouse, snapping));
    out
}

/// Whether a shape of `kind` with `vertex_count` vertices may be finished.
#[must_use]
pub fn can_complete(kind: ShapeKind, vertex_count: usize) -> bool {
    vertex_count >= kind.capabilities().min_vertices
}

/// Length of every edge.
#[must_use]
pub fn segment_distances(geometry: &dyn Geometry, vertices: &[Vec3], closed: bool) -> Vec<f64> {
    edges(vertices.len(), closed)
        .into_iter()
        .map(|(a, b)| geometry.distance(vertices[a], vertices[b]))
        .collect()
}

// =============================================================================
// ENGINE TRANSITIONS
// =============================================================================

impl<S: Scene, O: OverlayHost> InteractionEngine<S, O> {
    /// Enter drawing mode for `kind`. Switching kinds tears down the current drawing first.
    pub fn start_drawing(&mut self, kind: ShapeKind) {
        if !self.is_live() || self.state.drawing_mode() == Some(kind) {
            return;
        }
        self.stop_drawing();
        self.end_text_edit();
        self.select(None);
        self.hover(None);
        self.state.pending_select = None;
        self.state.drawing = DrawingState::Collecting { kind, vertices: Vec::new() };
        self.cache.open(CacheKey::Drawing);
        self.show_overlay(OverlayKind::SegmentLabels, ShowReason::Drawing);
        tracing::debug!(?kind, "drawing started");
    }

    /// Abandon the drawing in progress, if any.
    pub fn stop_drawing(&mut self) {
        if !self.is_live() {
            return;
        }
        if let Some(kind) = self.state.drawing_mode() {
            self.teardown_drawing();
            tracing::debug!(?kind, "drawing cancelled");
        }
    }

    pub(crate) fn drawing_click(&mut self, kind: ShapeKind, screen: ScreenPoint, point: Vec3) {
        if !kind.capabilities().needs_drawing_setup {
            self.finish_drawing(kind, vec![point]);
            return;
        }
        let on_confirm = matches!(
            self.scene.pick(screen),
            Some(Picked::Entity(ref id)) if id == CONFIRM_ENTITY_ID
        );
        if on_confirm || self.state.is_snapping {
            let vertices = self.state.drawn_vertices().to_vec();
            if can_complete(kind, vertices.len()) {
                self.finish_drawing(kind, vertices);
            }
            return;
        }

        let index = match &mut self.state.drawing {
            DrawingState::Collecting { vertices, .. } => {
                vertices.push(point);
                vertices.len() - 1
            }
            DrawingState::Idle => return,
        };
        self.events.vertex_added.emit(&VertexAdded { kind, point, index });
        if kind.capabilities().samples_elevation {
            self.cache.mark_stale(CacheKey::Drawing, index);
            self.events.sample_requested.emit(&SampleRequested { key: CacheKey::Drawing, index, position: point });
        }
        let distances = segment_distances(self.geometry.as_ref(), self.state.drawn_vertices(), false);
        self.cache.set_distances(CacheKey::Drawing, distances);
        self.refresh_drawing_entities(kind);
        self.update_snapping();
    }

    fn finish_drawing(&mut self, kind: ShapeKind, vertices: Vec<Vec3>) {
        let object_id = ObjectId::new_v4();
        tracing::debug!(object = %object_id, ?kind, vertices = vertices.len(), "drawing finished");
        self.teardown_drawing();
        self.state.pending_select = Some(object_id);
        self.events.drawing_finished.emit(&DrawingFinished { object_id, kind, vertices });
    }

    fn teardown_drawing(&mut self) {
        self.state.drawing = DrawingState::Idle;
        self.state.is_snapping = false;
        self.cache.close(CacheKey::Drawing);
        self.remove_drawing_entities();
        self.hide_overlay(OverlayKind::SegmentLabels, ShowReason::Drawing);
    }

    /// Replace the preview path and, once completable, the confirmation marker.
    fn refresh_drawing_entities(&mut self, kind: ShapeKind) {
        self.remove_drawing_entities();
        let vertices = self.state.drawn_vertices().to_vec();
        let mut entities = vec![SceneEntity {
            id: PREVIEW_ENTITY_ID.to_string(),
            role: EntityRole::DrawingPreview,
            positions: vertices.clone(),
            radius: None,
        }];
        if can_complete(kind, vertices.len()) {
            if let Some(last) = vertices.last() {
                entities.push(SceneEntity {
                    id: CONFIRM_ENTITY_ID.to_string(),
                    role: EntityRole::ConfirmMarker,
                    positions: vec![*last],
                    radius: None,
                });
            }
        }
        for entity in entities {
            match self.scene.add_entity(&entity) {
                Ok(()) => self.drawing_entities.push(entity.id),
                Err(e) => tracing::warn!(entity = %entity.id, error = %e, "drawing entity creation failed"),
            }
        }
    }

    pub(crate) fn remove_drawing_entities(&mut self) {
        for id in std::mem::take(&mut self.drawing_entities) {
            self.scene.remove_entity(&id);
        }
    }

    /// Recompute `is_snapping` from the pointer's screen position.
    pub(crate) fn update_snapping(&mut self) {
        let snapping = match (self.state.drawing_mode(), self.state.mouse_screen) {
            (Some(kind), Some(mouse)) if snap_eligible(kind, self.state.drawn_vertices().len()) => self
                .state
                .drawn_vertices()
                .first()
                .and_then(|first| self.scene.world_to_screen(*first))
                .is_some_and(|first| within_snap(mouse, first, self.config.snap_threshold_px)),
            _ => false,
        };
        self.state.is_snapping = snapping;
    }
}
