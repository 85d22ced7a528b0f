//! Overlay synchronizer: positions HTML label overlays over the 3D view.
//!
//! DESIGN
//! ======
//! Four overlay kinds exist: per-segment labels, the title label, the drag
//! summary and the inline text editor. Each is shown for a set of reasons
//! (hovering, selecting, drawing, dragging, editing) and stays shown while any
//! reason holds. When the first overlay becomes shown the engine subscribes
//! to the scene's pre-render hook; when the last one is hidden it
//! unsubscribes, and the hidden kind's DOM nodes are discarded.
//!
//! Every frame the engine resolves the rendered vertex set, projects the
//! anchors onto the canvas and writes a translate offset onto each node. A
//! segment label whose anchor falls too close to the title label is nudged by
//! a fixed offset. The title is hidden while dragging.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::collections::{BTreeSet, HashMap};

use crate::annotation::{Annotation, ObjectId, edges};
use crate::cache::CacheKey;
use crate::consts::SAMPLE_PLACEHOLDER;
use crate::engine::{InteractionEngine, RenderedSource};
use crate::error::OverlayError;
use crate::geo::{ScreenPoint, Vec3, normalize_angle};
use crate::input::DragTarget;
use crate::scene::Scene;

pub const TITLE_NODE_ID: &str = "geoedit-title";
pub const DRAG_SUMMARY_NODE_ID: &str = "geoedit-drag-summary";
pub const TEXT_EDITOR_NODE_ID: &str = "geoedit-text-editor";

/// Id of the label node for segment `index`.
#[must_use]
pub fn segment_node_id(index: usize) -> String {
    format!("geoedit-segment-{index}")
}

/// DOM-side collaborator that owns the overlay container.
pub trait OverlayHost {
    /// Whether the container that overlay nodes are appended to exists.
    fn has_container(&self) -> bool;

    /// Create the node `id` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError` when the node cannot be created.
    fn ensure_node(&mut self, id: &str) -> Result<(), OverlayError>;

    fn has_node(&self, id: &str) -> bool;

    /// Write a CSS translate offset (canvas pixels) onto the node.
    fn set_transform(&mut self, id: &str, at: ScreenPoint);

    fn set_text(&mut self, id: &str, text: &str);

    fn set_visible(&mut self, id: &str, visible: bool);

    fn remove_node(&mut self, id: &str);

    /// Focus the node's editable element and select all of its text.
    fn focus_and_select_all(&mut self, id: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    SegmentLabels,
    TitleLabel,
    DragSummary,
    TextEditor,
}

/// Why an overlay is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShowReason {
    Hover,
    Select,
    Drawing,
    Drag,
    Edit,
}

/// Per-kind visibility, reference-counted by reason.
#[derive(Debug, Default)]
pub struct OverlayVisibility {
    reasons: HashMap<OverlayKind, BTreeSet<ShowReason>>,
}

impl OverlayVisibility {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reason. Returns `true` if the kind went from hidden to shown.
    pub fn show(&mut self, kind: OverlayKind, reason: ShowReason) -> bool {
        let set = self.reasons.entry(kind).or_default();
        let was_empty = set.is_empty();
        set.insert(reason);
        was_empty
    }

    /// Remove a reason. Returns `true` if the kind went from shown to hidden.
    pub fn hide(&mut self, kind: OverlayKind, reason: ShowReason) -> bool {
        let Some(set) = self.reasons.get_mut(&kind) else {
            return false;
        };
        let removed = set.remove(&reason);
        removed && set.is_empty()
    }

    #[must_use]
    pub fn is_shown(&self, kind: OverlayKind) -> bool {
        self.reasons.get(&kind).is_some_and(|s| !s.is_empty())
    }

    #[must_use]
    pub fn any_shown(&self) -> bool {
        self.reasons.values().any(|s| !s.is_empty())
    }

    pub fn clear(&mut self) {
        self.reasons.clear();
    }
}

/// Overlay bookkeeping owned by the engine.
#[derive(Debug, Default)]
pub struct OverlayState {
    pub visibility: OverlayVisibility,
    /// Number of segment label nodes currently created.
    pub segment_nodes: usize,
    /// Object whose text is being edited.
    pub editing_text: Option<ObjectId>,
    /// Whether the pre-render hook is subscribed.
    pub subscribed: bool,
}

/// Offset a segment label when it lands within `overlap_px` of the title.
#[must_use]
pub fn nudge_segment_label(
    segment: ScreenPoint,
    title: Option<ScreenPoint>,
    overlap_px: f64,
    nudge: (f64, f64),
) -> ScreenPoint {
    match title {
        Some(t) if segment.distance(t) < overlap_px => segment.offset(nudge.0, nudge.1),
        _ => segment,
    }
}

/// Human-readable distance.
#[must_use]
pub fn format_distance(metres: f64) -> String {
    if !metres.is_finite() {
        return SAMPLE_PLACEHOLDER.to_string();
    }
    if metres.abs() < 1000.0 {
        format!("{metres:.1} m")
    } else {
        format!("{:.2} km", metres / 1000.0)
    }
}

/// Elevation text, or the placeholder when no fresh sample exists.
#[must_use]
pub fn format_elevation(elevation: Option<f64>) -> String {
    elevation.map_or_else(|| SAMPLE_PLACEHOLDER.to_string(), |e| format!("{e:.1} m"))
}

impl<S: Scene, O: OverlayHost> InteractionEngine<S, O> {
    /// Add a show reason, subscribing to frames on the first shown overlay.
    pub(crate) fn show_overlay(&mut self, kind: OverlayKind, reason: ShowReason) {
        self.overlay.visibility.show(kind, reason);
        self.sync_frame_subscription();
    }

    /// Remove a show reason; a kind that becomes hidden loses its nodes.
    pub(crate) fn hide_overlay(&mut self, kind: OverlayKind, reason: ShowReason) {
        if self.overlay.visibility.hide(kind, reason) {
            self.discard_nodes(kind);
        }
        self.sync_frame_subscription();
    }

    fn sync_frame_subscription(&mut self) {
        let wanted = self.overlay.visibility.any_shown();
        if wanted != self.overlay.subscribed {
            self.overlay.subscribed = wanted;
            self.scene.set_pre_render_subscribed(wanted);
        }
    }

    pub(crate) fn discard_nodes(&mut self, kind: OverlayKind) {
        match kind {
            OverlayKind::SegmentLabels => {
                for i in 0..self.overlay.segment_nodes {
                    self.overlays.remove_node(&segment_node_id(i));
                }
                self.overlay.segment_nodes = 0;
            }
            OverlayKind::TitleLabel => self.overlays.remove_node(TITLE_NODE_ID),
            OverlayKind::DragSummary => self.overlays.remove_node(DRAG_SUMMARY_NODE_ID),
            OverlayKind::TextEditor => self.overlays.remove_node(TEXT_EDITOR_NODE_ID),
        }
    }

    /// Drop every overlay node and reason.
    pub(crate) fn teardown_overlays(&mut self) {
        for kind in [
            OverlayKind::SegmentLabels,
            OverlayKind::TitleLabel,
            OverlayKind::DragSummary,
            OverlayKind::TextEditor,
        ] {
            self.discard_nodes(kind);
        }
        self.overlay.visibility.clear();
        self.overlay.editing_text = None;
        if self.overlay.subscribed {
            self.overlay.subscribed = false;
            if !self.scene.is_destroyed() {
                self.scene.set_pre_render_subscribed(false);
            }
        }
    }

    // --- Text editing ---

    /// Open the inline text editor over `id`.
    ///
    /// On first show the editor is focused with its text selected and the
    /// object's in-scene label is hidden.
    pub fn begin_text_edit(&mut self, id: ObjectId) {
        if !self.is_live() || self.overlay.editing_text == Some(id) {
            return;
        }
        let Some(annotation) = self.store.get(&id) else {
            return;
        };
        if !annotation.kind.capabilities().has_text {
            return;
        }
        self.end_text_edit();
        self.overlay.editing_text = Some(id);
        self.show_overlay(OverlayKind::TextEditor, ShowReason::Edit);
        if let Err(e) = self.overlays.ensure_node(TEXT_EDITOR_NODE_ID) {
            tracing::debug!(error = %e, "text editor node unavailable");
            return;
        }
        self.overlays.focus_and_select_all(TEXT_EDITOR_NODE_ID);
        self.scene.set_label_visible(id, false);
        tracing::debug!(object = %id, "text edit started");
    }

    /// Close the inline text editor and restore the in-scene label.
    pub fn end_text_edit(&mut self) {
        let Some(id) = self.overlay.editing_text.take() else {
            return;
        };
        if !self.scene.is_destroyed() {
            self.scene.set_label_visible(id, true);
        }
        self.hide_overlay(OverlayKind::TextEditor, ShowReason::Edit);
    }

    #[must_use]
    pub fn editing_text(&self) -> Option<ObjectId> {
        self.overlay.editing_text
    }

    // --- Frame sync ---

    /// Pre-render hook: position every shown overlay for this frame.
    pub fn on_pre_render(&mut self) {
        if !self.is_live() || !self.overlay.visibility.any_shown() {
            return;
        }
        let rendered = self.rendered();
        let Some(kind) = rendered.kind else {
            self.hide_frame_nodes();
            return;
        };
        let vertices = rendered.vertices;
        let dragging = self.state.is_dragging();

        let title_anchor = Annotation::title_anchor(kind, &vertices);
        let title_screen = title_anchor.and_then(|w| self.scene.world_to_screen(w));

        if self.overlay.visibility.is_shown(OverlayKind::TitleLabel) {
            let title = rendered
                .object_id
                .and_then(|id| self.store.get(&id))
                .map(|a| a.title.clone())
                .unwrap_or_default();
            self.place_node(TITLE_NODE_ID, title_screen.filter(|_| !dragging), &title);
        }

        if self.overlay.visibility.is_shown(OverlayKind::SegmentLabels) {
            let cache_key = match rendered.source {
                RenderedSource::Drawing => Some(CacheKey::Drawing),
                RenderedSource::Selected | RenderedSource::Dragging => rendered.object_id.map(CacheKey::Object),
                _ => None,
            };
            let caps = kind.capabilities();
            // The drawing preview already ends at the virtual next point.
            let closed = caps.is_closed_loop && rendered.source != RenderedSource::Drawing;
            self.place_segment_labels(&vertices, closed, title_screen, cache_key, caps.samples_elevation);
        }

        if self.overlay.visibility.is_shown(OverlayKind::DragSummary) {
            let (anchor, text) = self.drag_summary(&vertices);
            let at = anchor.and_then(|w| self.scene.world_to_screen(w));
            self.place_node(DRAG_SUMMARY_NODE_ID, at, &text);
        }

        if self.overlay.visibility.is_shown(OverlayKind::TextEditor) {
            let anchor = self
                .overlay
                .editing_text
                .and_then(|id| self.store.get(&id))
                .and_then(|a| Annotation::title_anchor(a.kind, &a.vertices()))
                .and_then(|w| self.scene.world_to_screen(w));
            if let Some(at) = anchor {
                if self.overlays.has_node(TEXT_EDITOR_NODE_ID) {
                    self.overlays.set_transform(TEXT_EDITOR_NODE_ID, at);
                }
            }
        }
    }

    fn place_segment_labels(
        &mut self,
        vertices: &[Vec3],
        closed: bool,
        title_screen: Option<ScreenPoint>,
        cache_key: Option<CacheKey>,
        sampled: bool,
    ) {
        let segs = edges(vertices.len(), closed);
        let cached = cache_key.map(|k| self.cache.distances(k).to_vec()).unwrap_or_default();
        let use_cache = cached.len() == segs.len() && !self.state.is_dragging();
        for (i, (a, b)) in segs.iter().enumerate() {
            let mid = vertices[*a].midpoint(vertices[*b]);
            let at = self.scene.world_to_screen(mid).map(|s| {
                nudge_segment_label(s, title_screen, self.config.label_overlap_px, self.config.label_nudge_px)
            });
            let distance = if use_cache { cached[i] } else { self.geometry.distance(vertices[*a], vertices[*b]) };
            let mut text = format_distance(distance);
            if sampled {
                let elevation = cache_key.and_then(|k| self.cache.elevation(k, *b));
                text = format!("{text} ({})", format_elevation(elevation));
            }
            self.place_node(&segment_node_id(i), at, &text);
        }
        for i in segs.len()..self.overlay.segment_nodes {
            self.overlays.remove_node(&segment_node_id(i));
        }
        self.overlay.segment_nodes = segs.len();
    }

    fn drag_summary(&self, vertices: &[Vec3]) -> (Option<Vec3>, String) {
        let Some(session) = self.state.drag.as_ref() else {
            return (None, String::new());
        };
        match session.target {
            DragTarget::Rotation { .. } => {
                let live = normalize_angle(session.start_heading + session.delta_angle);
                (vertices.first().copied(), format!("{:.1}°", live.to_degrees()))
            }
            _ => {
                let anchor = self.state.editing_index().and_then(|i| vertices.get(i).copied());
                (anchor, format_distance(self.geometry.path_length(vertices)))
            }
        }
    }

    /// Create (if needed) and position one node; hide it when `at` is `None`.
    fn place_node(&mut self, id: &str, at: Option<ScreenPoint>, text: &str) {
        if let Err(e) = self.overlays.ensure_node(id) {
            tracing::debug!(node = id, error = %e, "overlay node unavailable");
            return;
        }
        match at {
            Some(p) => {
                self.overlays.set_transform(id, p);
                self.overlays.set_text(id, text);
                self.overlays.set_visible(id, true);
            }
            None => self.overlays.set_visible(id, false),
        }
    }

    fn hide_frame_nodes(&mut self) {
        for i in 0..self.overlay.segment_nodes {
            self.overlays.set_visible(&segment_node_id(i), false);
        }
        for id in [TITLE_NODE_ID, DRAG_SUMMARY_NODE_ID] {
            if self.overlays.has_node(id) {
                self.overlays.set_visible(id, false);
            }
        }
    }
}
