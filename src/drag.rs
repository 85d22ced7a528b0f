//! Drag/edit engine.
//!
//! A drag runs from pointer-down to pointer-up. While it is active the live
//! vertex list is derived from the selection snapshot and the session by
//! `editing_locations`; nothing is written back to the store until release,
//! but the handle layer follows the live list. Rotation drags track a pointer
//! azimuth instead of a point and sum the per-move change, so a drag past
//! half a turn reports its full rotation.

use crate::annotation::Annotation;
use crate::cache::CacheKey;
use crate::drawing::segment_distances;
use crate::engine::InteractionEngine;
use crate::events::{DragChanged, GeometryCommitted, RotationDragChanged, SampleRequested};
use crate::geo::{Vec3, normalize_angle, signed_angle_delta};
use crate::handles::rotation_handle;
use crate::input::{DragSession, DragTarget};
use crate::overlay::{OverlayHost, OverlayKind, ShowReason};
use crate::scene::Scene;

/// Live vertex list for `session` applied to the selection snapshot.
///
/// Vertex drags replace the dragged vertex, insert drags add one after the
/// originating edge (at the edge midpoint until the pointer moves), and rigid
/// drags translate the whole shape so vertex 0 sits at pointer plus offset.
#[must_use]
pub fn apply_session(base: &[Vec3], session: &DragSession) -> Vec<Vec3> {
    let mut out = base.to_vec();
    match session.target {
        DragTarget::Vertex { index, .. } => {
            if let (Some(p), Some(slot)) = (session.live_point, out.get_mut(index)) {
                *slot = p;
            }
        }
        DragTarget::InsertHandle { edge, .. } => {
            let Some(start) = base.get(edge) else {
                return out;
            };
            let end = base.get(edge + 1).or_else(|| base.first()).copied().unwrap_or(*start);
            let point = session.live_point.unwrap_or_else(|| start.midpoint(end));
            out.insert(edge + 1, point);
        }
        DragTarget::Object { .. } => {
            if let (Some(p), Some(first)) = (session.live_point, base.first()) {
                let delta = p + session.offset - *first;
                for v in &mut out {
                    *v = *v + delta;
                }
            }
        }
        DragTarget::Rotation { .. } => {}
    }
    out
}

/// Stored positions for `vertices`, preserving a duplicated closing vertex
/// and any trailing positions of single-point kinds.
fn to_positions(annotation: &Annotation, vertices: &[Vec3]) -> Vec<Vec3> {
    let caps = annotation.kind.capabilities();
    if !caps.needs_drawing_setup {
        let mut positions = annotation.positions.clone();
        match (positions.first_mut(), vertices.first()) {
            (Some(slot), Some(v)) => *slot = *v,
            (None, Some(v)) => positions.push(*v),
            _ => {}
        }
        return positions;
    }
    let mut positions = vertices.to_vec();
    if caps.is_closed_loop && annotation.positions.len() > annotation.vertices().len() {
        positions.extend(vertices.first().copied());
    }
    positions
}

impl<S: Scene, O: OverlayHost> InteractionEngine<S, O> {
    /// Vertex list under edit: the live drag result, or the selection snapshot.
    #[must_use]
    pub fn editing_locations(&self) -> Vec<Vec3> {
        match self.state.drag.as_ref() {
            Some(session) => apply_session(&self.state.selected_vertices, session),
            None => self.state.selected_vertices.clone(),
        }
    }

    pub(crate) fn start_drag(&mut self, target: DragTarget, world: Option<Vec3>) {
        let object_id = target.object_id();
        if self.state.selected_object != Some(object_id) {
            self.select(Some(object_id));
        }
        if self.state.selected_object != Some(object_id) {
            return;
        }
        let Some(heading) = self.store.get(&object_id).map(|a| a.heading) else {
            return;
        };

        let mut session = DragSession::new(target);
        let center = self.state.selected_vertices.first().copied();
        match target {
            DragTarget::Object { .. } => {
                if let (Some(w), Some(first)) = (world, center) {
                    session.offset = first - w;
                }
            }
            DragTarget::Rotation { .. } => {
                session.start_heading = heading;
                session.start_angle = center
                    .zip(world)
                    .and_then(|(c, w)| self.geometry.azimuth(c, w))
                    .unwrap_or(heading);
                session.angle = session.start_angle;
            }
            DragTarget::InsertHandle { .. } | DragTarget::Vertex { .. } => {}
        }
        let start_angle = session.start_angle;
        self.state.drag = Some(session);
        self.scene.set_camera_controls_enabled(false);
        self.show_overlay(OverlayKind::DragSummary, ShowReason::Drag);

        let key = CacheKey::Object(object_id);
        if let DragTarget::InsertHandle { edge, .. } = target {
            self.cache.insert_index(key, edge + 1);
            let locations = self.editing_locations();
            self.rebuild_handles(object_id, &locations, heading);
        }
        if let Some(index) = self.state.editing_index() {
            self.cache.lock(key, index);
        }
        tracing::debug!(object = %object_id, ?target, "drag started");

        if let DragTarget::Rotation { .. } = target {
            self.events.rotation_drag_changed.emit(&RotationDragChanged {
                is_dragging: true,
                object_id,
                angle: start_angle,
                delta_angle: 0.0,
            });
        } else {
            let vertices = self.editing_locations();
            self.events.drag_changed.emit(&DragChanged { object_id, is_dragging: true, mouse: world, vertices });
        }
    }

    pub(crate) fn update_drag(&mut self, world: Option<Vec3>) {
        let center = self.state.selected_vertices.first().copied();
        let Some(session) = self.state.drag.as_mut() else {
            return;
        };
        let object_id = session.target.object_id();
        if let DragTarget::Rotation { .. } = session.target {
            if let Some(angle) = center.zip(world).and_then(|(c, w)| self.geometry.azimuth(c, w)) {
                session.delta_angle += signed_angle_delta(angle, session.angle);
                session.angle = angle;
            }
            let angle = session.angle;
            let delta_angle = session.delta_angle;
            let heading = normalize_angle(session.start_heading + delta_angle);
            self.events.rotation_drag_changed.emit(&RotationDragChanged {
                is_dragging: true,
                object_id,
                angle,
                delta_angle,
            });
            self.move_rotation_handle(heading);
            return;
        }
        if world.is_some() {
            session.live_point = world;
        }
        let vertices = self.editing_locations();
        if world.is_some() {
            if let Some(heading) = self.store.get(&object_id).map(|a| a.heading) {
                self.rebuild_handles(object_id, &vertices, heading);
            }
        }
        self.events.drag_changed.emit(&DragChanged { object_id, is_dragging: true, mouse: world, vertices });
    }

    fn move_rotation_handle(&mut self, heading: f64) {
        let Some(object_id) = self.state.dragging_object() else {
            return;
        };
        let (Some(center), Some(radius)) =
            (self.state.selected_vertices.first().copied(), self.store.get(&object_id).map(|a| a.radius))
        else {
            return;
        };
        match rotation_handle(object_id, center, heading, radius, self.geometry.as_ref(), &self.config) {
            Ok(entity) => self.handles.rebuild(&mut self.scene, vec![entity]),
            Err(e) => tracing::debug!(object = %object_id, error = %e, "rotation handle not moved"),
        }
    }

    /// Finish the active drag and commit its geometry.
    pub(crate) fn end_drag(&mut self) {
        let locations = self.editing_locations();
        let index = self.state.editing_index();
        let mouse = self.state.mouse_position;
        let Some(session) = self.state.drag.take() else {
            return;
        };
        self.release_drag_locks();
        let object_id = session.target.object_id();

        if let DragTarget::Rotation { .. } = session.target {
            let delta_angle = session.delta_angle;
            let heading = normalize_angle(session.start_heading + delta_angle);
            self.events.rotation_drag_changed.emit(&RotationDragChanged {
                is_dragging: false,
                object_id,
                angle: session.angle,
                delta_angle,
            });
            let Some(annotation) = self.store.get_mut(&object_id) else {
                return;
            };
            annotation.heading = heading;
            let positions = annotation.positions.clone();
            tracing::debug!(object = %object_id, heading, "rotation committed");
            self.events.geometry_committed.emit(&GeometryCommitted { object_id, positions, heading });
            self.state.pending_deselect = Some(object_id);
            return;
        }

        let Some(annotation) = self.store.get_mut(&object_id) else {
            return;
        };
        let positions = to_positions(annotation, &locations);
        annotation.positions.clone_from(&positions);
        let heading = annotation.heading;
        let caps = annotation.kind.capabilities();
        self.state.selected_vertices.clone_from(&locations);

        let key = CacheKey::Object(object_id);
        if let Some(index) = index.filter(|_| caps.samples_elevation) {
            if let Some(position) = locations.get(index).copied() {
                self.cache.mark_stale(key, index);
                self.events.sample_requested.emit(&SampleRequested { key, index, position });
            }
        }
        let distances = segment_distances(self.geometry.as_ref(), &locations, caps.is_closed_loop);
        self.cache.set_distances(key, distances);
        self.rebuild_handles(object_id, &locations, heading);

        tracing::debug!(object = %object_id, vertices = locations.len(), "drag committed");
        self.events.drag_changed.emit(&DragChanged {
            object_id,
            is_dragging: false,
            mouse,
            vertices: locations,
        });
        self.events.geometry_committed.emit(&GeometryCommitted { object_id, positions, heading });
    }

    /// Abort the active drag without committing.
    pub(crate) fn cancel_drag(&mut self) {
        if let Some(session) = self.state.drag.take() {
            self.release_drag_locks();
            tracing::debug!(object = %session.target.object_id(), "drag cancelled");
        }
    }

    fn release_drag_locks(&mut self) {
        self.scene.set_camera_controls_enabled(true);
        self.cache.unlock();
        self.hide_overlay(OverlayKind::DragSummary, ShowReason::Drag);
    }
}
