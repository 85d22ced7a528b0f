//! Rendering collaborator boundary.
//!
//! The engine never renders. It asks the host scene to pick, to project world
//! points onto the canvas, and to add or remove the lightweight entities it
//! owns (editing handles, the drawing preview, the confirmation marker).
//! Annotations themselves are rendered by presentation components that read
//! engine events.

use serde::{Deserialize, Serialize};

use crate::annotation::ObjectId;
use crate::error::SceneError;
use crate::geo::{ScreenPoint, Vec3};

/// Result of picking at a screen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picked {
    /// An annotation known to the application store.
    Annotation(ObjectId),
    /// An engine-owned entity, by the id the engine gave it.
    Entity(String),
    /// Anything else (terrain tiles, imagery, foreign layers).
    Other,
}

/// What an engine-owned entity is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    CornerHandle,
    InsertHandle,
    RotationHandle,
    DrawingPreview,
    ConfirmMarker,
}

/// Description of an engine-owned entity handed to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub id: String,
    pub role: EntityRole,
    pub positions: Vec<Vec3>,
    /// Ring radius for rotation handles.
    pub radius: Option<f64>,
}

/// Operations consumed from the rendering engine.
pub trait Scene {
    /// Whether the rendering surface has been disposed.
    fn is_destroyed(&self) -> bool;

    /// Whether the auxiliary layer that holds editing handles exists.
    fn has_handle_layer(&self) -> bool;

    /// Topmost pickable object at `screen`.
    fn pick(&self, screen: ScreenPoint) -> Option<Picked>;

    /// Every pickable object at `screen`, topmost first.
    fn drill_pick(&self, screen: ScreenPoint) -> Vec<Picked>;

    /// World position under `screen` (terrain or model surface).
    fn pick_position(&self, screen: ScreenPoint) -> Option<Vec3>;

    /// Project a world position onto the canvas. `None` when not visible.
    fn world_to_screen(&self, world: Vec3) -> Option<ScreenPoint>;

    /// Add an engine-owned entity.
    ///
    /// # Errors
    ///
    /// Returns `SceneError` when the entity cannot be created.
    fn add_entity(&mut self, entity: &SceneEntity) -> Result<(), SceneError>;

    /// Remove an engine-owned entity. Unknown ids are ignored.
    fn remove_entity(&mut self, id: &str);

    /// Enable or disable camera navigation.
    fn set_camera_controls_enabled(&mut self, enabled: bool);

    /// Whether the camera is currently being panned or flown.
    fn is_camera_moving(&self) -> bool;

    /// Start or stop calling the engine's pre-render hook every frame.
    fn set_pre_render_subscribed(&mut self, subscribed: bool);

    /// Show or hide an annotation's in-scene label.
    fn set_label_visible(&mut self, id: ObjectId, visible: bool);
}
