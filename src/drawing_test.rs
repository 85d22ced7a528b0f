use super::*;
use crate::annotation::Annotation;
use crate::engine::RenderedSource;
use crate::overlay::segment_node_id;
use crate::test_helpers::{annotation, engine, record, sp, v};

fn click(e: &mut crate::test_helpers::TestEngine, x: f64, y: f64) {
    e.on_click(sp(x, y), crate::input::Button::Primary);
}

fn polygon_with_three(e: &mut crate::test_helpers::TestEngine) {
    e.start_drawing(ShapeKind::Polygon);
    click(e, 0.0, 0.0);
    click(e, 100.0, 0.0);
    click(e, 100.0, 100.0);
}

// =============================================================
// Pure helpers
// =============================================================

#[test]
fn snap_eligible_needs_closed_loop_and_minimum() {
    assert!(!snap_eligible(ShapeKind::Polygon, 2));
    assert!(snap_eligible(ShapeKind::Polygon, 3));
    assert!(!snap_eligible(ShapeKind::Polyline, 5));
}

#[test]
fn within_snap_is_inclusive() {
    assert!(within_snap(sp(10.0, 0.0), sp(0.0, 0.0), 10.0));
    assert!(!within_snap(sp(10.1, 0.0), sp(0.0, 0.0), 10.0));
}

#[test]
fn virtual_next_point_prefers_first_when_snapping() {
    let verts = [v(1.0, 1.0), v(5.0, 5.0)];
    assert_eq!(virtual_next_point(&verts, Some(v(9.0, 9.0)), true), Some(v(1.0, 1.0)));
    assert_eq!(virtual_next_point(&verts, Some(v(9.0, 9.0)), false), Some(v(9.0, 9.0)));
    assert_eq!(virtual_next_point(&[], None, true), None);
}

#[test]
fn preview_appends_virtual_point() {
    let verts = [v(0.0, 0.0)];
    assert_eq!(preview_vertices(&verts, Some(v(3.0, 0.0)), false), vec![v(0.0, 0.0), v(3.0, 0.0)]);
    assert_eq!(preview_vertices(&verts, None, false), vec![v(0.0, 0.0)]);
}

#[test]
fn can_complete_per_kind() {
    assert!(!can_complete(ShapeKind::Polyline, 1));
    assert!(can_complete(ShapeKind::Polyline, 2));
    assert!(!can_complete(ShapeKind::Polygon, 2));
    assert!(can_complete(ShapeKind::Marker, 1));
}

#[test]
fn segment_distances_closed_includes_closing_edge() {
    let verts = [v(0.0, 0.0), v(3.0, 0.0), v(3.0, 4.0)];
    let open = segment_distances(&crate::geo::Planar, &verts, false);
    let closed = segment_distances(&crate::geo::Planar, &verts, true);
    assert_eq!(open, vec![3.0, 4.0]);
    assert_eq!(closed, vec![3.0, 4.0, 5.0]);
}

// =============================================================
// Collecting
// =============================================================

#[test]
fn start_drawing_enters_collecting() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    assert_eq!(e.state().drawing_mode(), Some(ShapeKind::Polyline));
    assert!(e.cache().is_open(CacheKey::Drawing));
    assert!(e.is_overlay_shown(OverlayKind::SegmentLabels));
}

#[test]
fn click_appends_vertex_and_emits_events() {
    let mut e = engine();
    let added = record(&mut e.events.vertex_added);
    let samples = record(&mut e.events.sample_requested);
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 1.0, 2.0);
    click(&mut e, 4.0, 6.0);

    assert_eq!(e.state().drawn_vertices(), &[v(1.0, 2.0), v(4.0, 6.0)]);
    let added = added.borrow();
    assert_eq!(added.len(), 2);
    assert_eq!(added[1].index, 1);
    assert_eq!(added[1].point, v(4.0, 6.0));
    assert_eq!(samples.borrow().len(), 2);
    assert_eq!(e.cache().distances(CacheKey::Drawing), &[5.0]);
}

#[test]
fn confirm_marker_appears_once_completable() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    assert!(e.scene().entities.contains_key(PREVIEW_ENTITY_ID));
    assert!(!e.scene().entities.contains_key(CONFIRM_ENTITY_ID));
    click(&mut e, 10.0, 0.0);
    let confirm = &e.scene().entities[CONFIRM_ENTITY_ID];
    assert_eq!(confirm.positions, vec![v(10.0, 0.0)]);
}

#[test]
fn two_vertex_polyline_finishes_in_click_order() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 10.0, 0.0);
    e.scene_mut().place(sp(10.0, 0.0), vec![Picked::Entity(CONFIRM_ENTITY_ID.into())]);
    click(&mut e, 10.0, 0.0);

    let finished = finished.borrow();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].kind, ShapeKind::Polyline);
    assert_eq!(finished[0].vertices, vec![v(0.0, 0.0), v(10.0, 0.0)]);
    assert_eq!(e.state().drawing_mode(), None);
    assert!(e.state().drawn_vertices().is_empty());
}

#[test]
fn confirm_before_minimum_is_ignored() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Polygon);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 10.0, 0.0);
    e.scene_mut().place(sp(10.0, 0.0), vec![Picked::Entity(CONFIRM_ENTITY_ID.into())]);
    click(&mut e, 10.0, 0.0);

    assert!(finished.borrow().is_empty());
    assert_eq!(e.state().drawing_mode(), Some(ShapeKind::Polygon));
    assert_eq!(e.state().drawn_vertices().len(), 2);
}

#[test]
fn finish_tears_down_drawing_state() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 10.0, 0.0);
    e.scene_mut().place(sp(10.0, 0.0), vec![Picked::Entity(CONFIRM_ENTITY_ID.into())]);
    click(&mut e, 10.0, 0.0);

    assert!(e.scene().entities.is_empty());
    assert!(!e.cache().is_open(CacheKey::Drawing));
    assert!(!e.is_overlay_shown(OverlayKind::SegmentLabels));
    assert!(!e.scene().pre_render);
    assert_eq!(e.state().pending_select, Some(finished.borrow()[0].object_id));
}

#[test]
fn single_point_kind_finishes_on_first_click() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    let added = record(&mut e.events.vertex_added);
    e.start_drawing(ShapeKind::Marker);
    click(&mut e, 3.0, 4.0);

    assert_eq!(finished.borrow().len(), 1);
    assert_eq!(finished.borrow()[0].vertices, vec![v(3.0, 4.0)]);
    assert!(added.borrow().is_empty());
    assert_eq!(e.state().drawing_mode(), None);
}

#[test]
fn click_without_ground_is_ignored() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    e.scene_mut().ground = false;
    click(&mut e, 3.0, 4.0);
    assert!(e.state().drawn_vertices().is_empty());
}

// =============================================================
// Snapping
// =============================================================

#[test]
fn pointer_near_first_vertex_snaps_preview() {
    let mut e = engine();
    polygon_with_three(&mut e);
    e.on_pointer_move(sp(5.0, 5.0));

    assert!(e.state().is_snapping);
    let rendered = e.rendered();
    assert_eq!(rendered.source, RenderedSource::Drawing);
    assert_eq!(rendered.vertices.last(), Some(&v(0.0, 0.0)));

    e.on_pointer_move(sp(3.0, 4.0));
    assert!(e.state().is_snapping);
    assert_eq!(e.rendered().vertices.last(), Some(&v(0.0, 0.0)));
}

#[test]
fn pointer_away_from_first_vertex_does_not_snap() {
    let mut e = engine();
    polygon_with_three(&mut e);
    e.on_pointer_move(sp(50.0, 50.0));
    assert!(!e.state().is_snapping);
    assert_eq!(e.rendered().vertices.last(), Some(&v(50.0, 50.0)));
}

#[test]
fn snapping_requires_minimum_vertices() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polygon);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 100.0, 0.0);
    e.on_pointer_move(sp(1.0, 1.0));
    assert!(!e.state().is_snapping);
}

#[test]
fn open_path_never_snaps() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 100.0, 0.0);
    click(&mut e, 100.0, 100.0);
    e.on_pointer_move(sp(1.0, 1.0));
    assert!(!e.state().is_snapping);
}

#[test]
fn click_while_snapping_closes_loop() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    polygon_with_three(&mut e);
    e.on_pointer_move(sp(4.0, 4.0));
    click(&mut e, 4.0, 4.0);

    let finished = finished.borrow();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].vertices, vec![v(0.0, 0.0), v(100.0, 0.0), v(100.0, 100.0)]);
    assert!(!e.state().is_snapping);
}

// =============================================================
// Cancellation and kind switches
// =============================================================

#[test]
fn stop_drawing_removes_preview_entities() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    click(&mut e, 10.0, 0.0);
    e.stop_drawing();

    assert_eq!(e.state().drawing_mode(), None);
    assert!(e.scene().entities.is_empty());
    assert!(!e.cache().is_open(CacheKey::Drawing));
    assert_eq!(e.state().pending_select, None);
}

#[test]
fn switching_kind_restarts_collection() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    e.start_drawing(ShapeKind::Polygon);

    assert_eq!(e.state().drawing_mode(), Some(ShapeKind::Polygon));
    assert!(e.state().drawn_vertices().is_empty());
    assert!(e.scene().entities.is_empty());
}

#[test]
fn start_same_kind_keeps_vertices() {
    let mut e = engine();
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    e.start_drawing(ShapeKind::Polyline);
    assert_eq!(e.state().drawn_vertices().len(), 1);
}

#[test]
fn start_drawing_clears_selection() {
    let target: Annotation = annotation(ShapeKind::Polyline, &[(0.0, 0.0), (10.0, 0.0)]);
    let id = target.id;
    let mut e = crate::test_helpers::engine_with(vec![target]);
    e.select(Some(id));
    e.start_drawing(ShapeKind::Polygon);
    assert_eq!(e.state().selected_object, None);
    assert!(e.handles().is_empty());
}

// =============================================================
// Pending selection
// =============================================================

#[test]
fn created_object_with_drawn_id_is_selected() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Marker);
    click(&mut e, 3.0, 4.0);
    let id = finished.borrow()[0].object_id;

    e.on_object_created(Annotation::new(id, ShapeKind::Marker, vec![v(3.0, 4.0)]));
    assert_eq!(e.state().selected_object, Some(id));
    assert_eq!(e.state().pending_select, None);
}

#[test]
fn object_of_same_kind_from_elsewhere_is_not_selected() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Marker);
    click(&mut e, 3.0, 4.0);

    // Another client's marker lands before ours.
    e.on_object_created(annotation(ShapeKind::Marker, &[(9.0, 9.0)]));
    assert_eq!(e.state().selected_object, None);

    let id = finished.borrow()[0].object_id;
    e.on_object_created(Annotation::new(id, ShapeKind::Marker, vec![v(3.0, 4.0)]));
    assert_eq!(e.state().selected_object, Some(id));
}

#[test]
fn each_finished_drawing_gets_a_fresh_id() {
    let mut e = engine();
    let finished = record(&mut e.events.drawing_finished);
    e.start_drawing(ShapeKind::Marker);
    click(&mut e, 1.0, 1.0);
    e.start_drawing(ShapeKind::Marker);
    click(&mut e, 2.0, 2.0);

    let finished = finished.borrow();
    assert_eq!(finished.len(), 2);
    assert_ne!(finished[0].object_id, finished[1].object_id);
    assert_eq!(e.state().pending_select, Some(finished[1].object_id));
}

#[test]
fn drawing_precedes_hover_in_rendered_view() {
    let hovered = annotation(ShapeKind::Polyline, &[(50.0, 50.0), (60.0, 60.0)]);
    let id = hovered.id;
    let mut e = crate::test_helpers::engine_with(vec![hovered]);
    e.start_drawing(ShapeKind::Polyline);
    click(&mut e, 0.0, 0.0);
    e.state.hovered_object = Some(id);
    e.state.hovered_vertices = vec![v(50.0, 50.0), v(60.0, 60.0)];

    let rendered = e.rendered();
    assert_eq!(rendered.source, RenderedSource::Drawing);
    assert_eq!(rendered.vertices[0], v(0.0, 0.0));
    assert!(!rendered.vertices.contains(&v(60.0, 60.0)));
}

#[test]
fn snapped_preview_labels_each_edge_once() {
    let mut e = engine();
    polygon_with_three(&mut e);
    e.on_pointer_move(sp(4.0, 4.0));
    assert!(e.state().is_snapping);
    e.on_pre_render();

    let text = |i: usize| e.overlays().node(&segment_node_id(i)).map(|n| n.text.clone()).unwrap_or_default();
    assert_eq!(text(0), "100.0 m (-)");
    assert_eq!(text(1), "100.0 m (-)");
    assert_eq!(text(2), "141.4 m (-)");
    assert!(!e.overlays().has_node(&segment_node_id(3)));
}

#[test]
fn unsnapped_preview_labels_edge_to_pointer_only() {
    let mut e = engine();
    polygon_with_three(&mut e);
    e.on_pointer_move(sp(0.0, 100.0));
    e.on_pre_render();

    let last = e.overlays().node(&segment_node_id(2)).map(|n| n.text.clone());
    assert_eq!(last.as_deref(), Some("100.0 m (-)"));
    assert!(!e.overlays().has_node(&segment_node_id(3)));
}
