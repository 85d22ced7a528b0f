#![allow(clippy::float_cmp)]

use super::*;
use crate::annotation::ShapeKind;
use crate::geo::Planar;
use crate::test_helpers::{MockScene, v};

fn polygon_handles(id: ObjectId) -> Vec<SceneEntity> {
    let verts = [v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0)];
    build_handles(id, ShapeKind::Polygon.capabilities(), &verts, 0.0, 0.0, &Planar, &EngineConfig::default()).unwrap()
}

// =============================================================
// HandleId
// =============================================================

#[test]
fn handle_id_display_format() {
    let id = Uuid::nil();
    let h = HandleId::new(HandleRole::Insert, id, 3);
    assert_eq!(h.to_string(), format!("insert-{id}-3"));
}

#[test]
fn handle_id_parse_inverts_display() {
    let h = HandleId::new(HandleRole::Corner, Uuid::new_v4(), 12);
    assert_eq!(HandleId::parse(&h.to_string()), Some(h));
}

#[test]
fn handle_id_parse_rejects_foreign_ids() {
    assert!(HandleId::parse("confirm-drawing-0").is_none());
    assert!(HandleId::parse("corner-not-a-uuid-1").is_none());
    assert!(HandleId::parse(&format!("corner-{}-x", Uuid::new_v4())).is_none());
    assert!(HandleId::parse("corner").is_none());
}

// =============================================================
// Construction
// =============================================================

#[test]
fn polygon_gets_corner_and_insert_handles() {
    let id = Uuid::new_v4();
    let handles = polygon_handles(id);
    let corners = handles.iter().filter(|h| h.role == EntityRole::CornerHandle).count();
    let inserts: Vec<&SceneEntity> = handles.iter().filter(|h| h.role == EntityRole::InsertHandle).collect();
    assert_eq!(corners, 3);
    assert_eq!(inserts.len(), 3);
    let closing = HandleId::new(HandleRole::Insert, id, 2).to_string();
    let Some(closing) = inserts.iter().find(|h| h.id == closing) else {
        panic!("closing edge should have an insert handle");
    };
    assert_eq!(closing.positions, vec![v(5.0, 5.0)]);
}

#[test]
fn polyline_has_no_closing_insert_handle() {
    let id = Uuid::new_v4();
    let verts = [v(0.0, 0.0), v(10.0, 0.0), v(20.0, 0.0)];
    let handles =
        build_handles(id, ShapeKind::Polyline.capabilities(), &verts, 0.0, 0.0, &Planar, &EngineConfig::default())
            .unwrap();
    assert_eq!(handles.iter().filter(|h| h.role == EntityRole::InsertHandle).count(), 2);
}

#[test]
fn marker_gets_no_handles() {
    let handles = build_handles(
        Uuid::new_v4(),
        ShapeKind::Marker.capabilities(),
        &[v(1.0, 1.0)],
        0.0,
        0.0,
        &Planar,
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(handles.is_empty());
}

#[test]
fn model_gets_single_rotation_handle() {
    let handles = build_handles(
        Uuid::new_v4(),
        ShapeKind::Model.capabilities(),
        &[v(0.0, 0.0)],
        0.0,
        10.0,
        &Planar,
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].role, EntityRole::RotationHandle);
    assert_eq!(handles[0].radius, Some(15.0));
    assert!(handles[0].positions[1].approx_eq(v(0.0, 15.0), 1e-9));
}

#[test]
fn rotation_handle_grip_follows_heading() {
    let cfg = EngineConfig::default();
    let h = rotation_handle(Uuid::new_v4(), v(0.0, 0.0), std::f64::consts::FRAC_PI_2, 10.0, &Planar, &cfg).unwrap();
    assert!(h.positions[1].approx_eq(v(15.0, 0.0), 1e-9));
}

#[test]
fn rotation_handle_respects_minimum_radius() {
    let cfg = EngineConfig::default();
    let h = rotation_handle(Uuid::new_v4(), v(0.0, 0.0), 0.0, 0.5, &Planar, &cfg).unwrap();
    assert_eq!(h.radius, Some(5.0));
}

#[test]
fn rotation_handle_rejects_non_finite_radius() {
    let cfg = EngineConfig::default();
    let err = rotation_handle(Uuid::new_v4(), v(0.0, 0.0), 0.0, f64::INFINITY, &Planar, &cfg);
    assert!(matches!(err, Err(SceneError::Rejected { .. })));
}

// =============================================================
// HandleLayer
// =============================================================

#[test]
fn layer_rebuild_adds_all_handles() {
    let mut scene = MockScene::default();
    let mut layer = HandleLayer::new();
    let id = Uuid::new_v4();
    layer.rebuild(&mut scene, polygon_handles(id));
    assert_eq!(layer.len(), 6);
    assert_eq!(scene.entities.len(), 6);
    assert!(layer.contains(&HandleId::new(HandleRole::Corner, id, 0)));
}

#[test]
fn layer_duplicate_add_is_counted_noop() {
    let mut scene = MockScene::default();
    let mut layer = HandleLayer::new();
    let entity = polygon_handles(Uuid::new_v4()).remove(0);
    layer.add(&mut scene, entity.clone()).unwrap();
    layer.add(&mut scene, entity).unwrap();
    assert_eq!(layer.len(), 1);
    assert_eq!(scene.added.len(), 1);
    assert_eq!(layer.duplicate_adds(), 1);
}

#[test]
fn layer_clear_removes_from_scene() {
    let mut scene = MockScene::default();
    let mut layer = HandleLayer::new();
    layer.rebuild(&mut scene, polygon_handles(Uuid::new_v4()));
    layer.clear(&mut scene);
    assert!(layer.is_empty());
    assert!(scene.entities.is_empty());
    assert_eq!(scene.removed.len(), 6);
}

#[test]
fn layer_rebuild_skips_rejected_entities() {
    let mut scene = MockScene { reject_adds: true, ..MockScene::default() };
    let mut layer = HandleLayer::new();
    layer.rebuild(&mut scene, polygon_handles(Uuid::new_v4()));
    assert!(layer.is_empty());
}
