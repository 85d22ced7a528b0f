//! Editing handle layer: corner, insert and rotation handles.
//!
//! DESIGN
//! ======
//! Handles are engine-owned scene entities keyed by a deterministic id of the
//! form `{role}-{objectId}-{index}`. The layer is never persisted and is torn
//! down and rebuilt whole on every selection change, so it only needs to
//! remember which ids it has handed to the scene.
//!
//! Adding an id that already exists is a no-op. That guard covers a rare
//! double-creation race seen in the field; every occurrence is logged and
//! counted so the race can be traced.

#[cfg(test)]
#[path = "handles_test.rs"]
mod handles_test;

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::annotation::{Capabilities, ObjectId, edges};
use crate::config::EngineConfig;
use crate::error::SceneError;
use crate::geo::{Geometry, Vec3};
use crate::scene::{EntityRole, Scene, SceneEntity};

/// What a handle does when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandleRole {
    /// Moves one vertex.
    Corner,
    /// Inserts a vertex on an edge.
    Insert,
    /// Rotates an oriented object.
    Rotation,
}

impl HandleRole {
    fn prefix(self) -> &'static str {
        match self {
            Self::Corner => "corner",
            Self::Insert => "insert",
            Self::Rotation => "rotation",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "corner" => Some(Self::Corner),
            "insert" => Some(Self::Insert),
            "rotation" => Some(Self::Rotation),
            _ => None,
        }
    }

    #[must_use]
    pub fn entity_role(self) -> EntityRole {
        match self {
            Self::Corner => EntityRole::CornerHandle,
            Self::Insert => EntityRole::InsertHandle,
            Self::Rotation => EntityRole::RotationHandle,
        }
    }
}

/// Deterministic handle identity.
///
/// `index` is the vertex index for corners, the edge's start vertex for
/// insert handles, and always 0 for rotation handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId {
    pub role: HandleRole,
    pub object_id: ObjectId,
    pub index: usize,
}

impl HandleId {
    #[must_use]
    pub fn new(role: HandleRole, object_id: ObjectId, index: usize) -> Self {
        Self { role, object_id, index }
    }

    /// Parse an entity id produced by `to_string`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, rest) = raw.split_once('-')?;
        let role = HandleRole::from_prefix(prefix)?;
        let (uuid, index) = rest.rsplit_once('-')?;
        let Ok(object_id) = Uuid::try_parse(uuid) else {
            return None;
        };
        let Ok(index) = index.parse::<usize>() else {
            return None;
        };
        Some(Self { role, object_id, index })
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.role.prefix(), self.object_id, self.index)
    }
}

/// Build the handle set for an object from its capabilities.
///
/// Vertex-editable kinds get one corner per vertex and one insert handle per
/// edge. Rotatable kinds get a single rotation handle.
///
/// # Errors
///
/// Returns `SceneError::Rejected` when the rotation ring cannot be placed.
pub fn build_handles(
    object_id: ObjectId,
    caps: Capabilities,
    vertices: &[Vec3],
    heading: f64,
    radius: f64,
    geometry: &dyn Geometry,
    config: &EngineConfig,
) -> Result<Vec<SceneEntity>, SceneError> {
    let mut out = Vec::new();
    if caps.vertex_editable {
        for (i, v) in vertices.iter().enumerate() {
            out.push(SceneEntity {
                id: HandleId::new(HandleRole::Corner, object_id, i).to_string(),
                role: HandleRole::Corner.entity_role(),
                positions: vec![*v],
                radius: None,
            });
        }
        for (a, b) in edges(vertices.len(), caps.is_closed_loop) {
            out.push(SceneEntity {
                id: HandleId::new(HandleRole::Insert, object_id, a).to_string(),
                role: HandleRole::Insert.entity_role(),
                positions: vec![vertices[a].midpoint(vertices[b])],
                radius: None,
            });
        }
    } else if caps.rotatable {
        if let Some(center) = vertices.first() {
            out.push(rotation_handle(object_id, *center, heading, radius, geometry, config)?);
        }
    }
    Ok(out)
}

/// Rotation ring around `center` with a grip at `heading`.
///
/// # Errors
///
/// Returns `SceneError::Rejected` when the local frame is undefined or the
/// ring radius is not finite.
pub fn rotation_handle(
    object_id: ObjectId,
    center: Vec3,
    heading: f64,
    radius: f64,
    geometry: &dyn Geometry,
    config: &EngineConfig,
) -> Result<SceneEntity, SceneError> {
    let id = HandleId::new(HandleRole::Rotation, object_id, 0).to_string();
    let ring = (radius * config.rotation_handle_scale).max(config.rotation_handle_min_radius);
    if !ring.is_finite() {
        return Err(SceneError::Rejected { id, reason: format!("ring radius {ring} is not finite") });
    }
    let Some(frame) = geometry.local_frame(center) else {
        return Err(SceneError::Rejected { id, reason: "no local frame at object position".into() });
    };
    let dir = frame.east * heading.sin() + frame.north * heading.cos();
    Ok(SceneEntity {
        id,
        role: HandleRole::Rotation.entity_role(),
        positions: vec![center, center + dir * ring],
        radius: Some(ring),
    })
}

/// Engine-owned record of handles currently in the scene.
#[derive(Debug, Default)]
pub struct HandleLayer {
    handles: BTreeMap<String, SceneEntity>,
    duplicate_adds: u64,
}

impl HandleLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the scene unless one with the same id exists.
    ///
    /// # Errors
    ///
    /// Propagates the scene's refusal to create the entity.
    pub fn add<S: Scene + ?Sized>(&mut self, scene: &mut S, entity: SceneEntity) -> Result<(), SceneError> {
        if self.handles.contains_key(&entity.id) {
            self.duplicate_adds += 1;
            tracing::warn!(
                handle = %entity.id,
                occurrences = self.duplicate_adds,
                "duplicate handle creation ignored"
            );
            return Ok(());
        }
        scene.add_entity(&entity)?;
        self.handles.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Remove every handle from the scene.
    pub fn clear<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        for id in self.handles.keys() {
            scene.remove_entity(id);
        }
        self.handles.clear();
    }

    /// Tear down and add `entities`. Entities the scene rejects are logged and skipped.
    pub fn rebuild<S: Scene + ?Sized>(&mut self, scene: &mut S, entities: Vec<SceneEntity>) {
        self.clear(scene);
        for entity in entities {
            let id = entity.id.clone();
            if let Err(e) = self.add(scene, entity) {
                tracing::warn!(handle = %id, error = %e, "handle creation failed");
            }
        }
    }

    #[must_use]
    pub fn contains(&self, id: &HandleId) -> bool {
        self.handles.contains_key(&id.to_string())
    }

    #[must_use]
    pub fn get(&self, id: &HandleId) -> Option<&SceneEntity> {
        self.handles.get(&id.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of duplicate adds swallowed since construction.
    #[must_use]
    pub fn duplicate_adds(&self) -> u64 {
        self.duplicate_adds
    }
}
