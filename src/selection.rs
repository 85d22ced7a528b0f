//! Selection and hover lifecycle.
//!
//! Selection and hover are explicit transitions. Setting either to its
//! current value is a no-op; any other change snapshots the object's vertex
//! list and performs the side effects (handle layer rebuild, cache entry
//! open/close, overlay reasons) at the call site.

use crate::annotation::ObjectId;
use crate::cache::CacheKey;
use crate::drawing::segment_distances;
use crate::engine::InteractionEngine;
use crate::events::{HoverChanged, SampleRequested, SelectionChanged};
use crate::geo::Vec3;
use crate::handles::build_handles;
use crate::overlay::{OverlayHost, OverlayKind, ShowReason};
use crate::scene::Scene;

impl<S: Scene, O: OverlayHost> InteractionEngine<S, O> {
    /// Select `id`, or clear the selection with `None`.
    ///
    /// Ids unknown to the store resolve to `None`.
    pub fn select(&mut self, id: Option<ObjectId>) {
        if !self.is_live() {
            return;
        }
        let id = id.filter(|i| self.store.get(i).is_some());
        if id == self.state.selected_object {
            return;
        }
        self.cancel_drag();
        if let Some(prev) = self.state.selected_object.take() {
            self.cache.close(CacheKey::Object(prev));
            self.hide_overlay(OverlayKind::SegmentLabels, ShowReason::Select);
            self.hide_overlay(OverlayKind::TitleLabel, ShowReason::Select);
        }
        self.end_text_edit();
        self.handles.clear(&mut self.scene);
        self.state.selected_vertices.clear();
        self.state.pending_deselect = None;

        let Some(id) = id else {
            tracing::debug!("selection cleared");
            self.events.selection_changed.emit(&SelectionChanged { object_id: None, is_special_category: false });
            return;
        };
        self.hover(None);
        self.state.selected_object = Some(id);
        self.refresh_selection();
        self.show_overlay(OverlayKind::SegmentLabels, ShowReason::Select);
        self.show_overlay(OverlayKind::TitleLabel, ShowReason::Select);

        let is_special_category = self.store.get(&id).is_some_and(|a| a.kind.is_special_category());
        tracing::debug!(object = %id, is_special_category, "selected");
        self.events.selection_changed.emit(&SelectionChanged { object_id: Some(id), is_special_category });
    }

    /// Hover `id`, or clear the hover with `None`.
    pub fn hover(&mut self, id: Option<ObjectId>) {
        if !self.is_live() {
            return;
        }
        let id = id.filter(|i| self.store.get(i).is_some());
        if id == self.state.hovered_object {
            return;
        }
        self.state.hovered_object = id;
        self.state.hovered_vertices = id.and_then(|i| self.store.get(&i)).map(|a| a.vertices()).unwrap_or_default();
        if id.is_some() {
            self.show_overlay(OverlayKind::SegmentLabels, ShowReason::Hover);
            self.show_overlay(OverlayKind::TitleLabel, ShowReason::Hover);
        } else {
            self.hide_overlay(OverlayKind::SegmentLabels, ShowReason::Hover);
            self.hide_overlay(OverlayKind::TitleLabel, ShowReason::Hover);
        }
        self.events.hover_changed.emit(&HoverChanged { object_id: id });
    }

    /// Re-snapshot the selected object from the store.
    ///
    /// Samples are requested again only when the vertex list changed.
    pub(crate) fn refresh_selection(&mut self) {
        let Some(id) = self.state.selected_object else {
            return;
        };
        let Some(annotation) = self.store.get(&id) else {
            return;
        };
        let caps = annotation.kind.capabilities();
        let heading = annotation.heading;
        let vertices = annotation.vertices();

        let key = CacheKey::Object(id);
        let changed = !self.cache.is_open(key) || self.state.selected_vertices != vertices;
        self.state.selected_vertices.clone_from(&vertices);
        if changed {
            self.cache.open(key);
            if caps.samples_elevation {
                for (index, position) in vertices.iter().enumerate() {
                    self.cache.mark_stale(key, index);
                    self.events.sample_requested.emit(&SampleRequested { key, index, position: *position });
                }
            }
        }
        let distances = segment_distances(self.geometry.as_ref(), &vertices, caps.is_closed_loop);
        self.cache.set_distances(key, distances);
        self.rebuild_handles(id, &vertices, heading);
    }

    /// Tear down and rebuild the handle layer for `object_id` at `vertices`.
    pub(crate) fn rebuild_handles(&mut self, object_id: ObjectId, vertices: &[Vec3], heading: f64) {
        let Some(annotation) = self.store.get(&object_id) else {
            self.handles.clear(&mut self.scene);
            return;
        };
        let caps = annotation.kind.capabilities();
        let radius = annotation.radius;
        match build_handles(object_id, caps, vertices, heading, radius, self.geometry.as_ref(), &self.config) {
            Ok(entities) => self.handles.rebuild(&mut self.scene, entities),
            Err(e) => {
                tracing::warn!(object = %object_id, error = %e, "handle construction failed");
                self.handles.clear(&mut self.scene);
            }
        }
    }
}
