//! Error types for the interaction engine and its collaborators.

/// Fatal setup failures raised by [`crate::engine::InteractionEngine::new`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The scene has no layer to hold editing handles.
    #[error("editing handle layer is missing from the scene")]
    MissingHandleLayer,
    /// The overlay host has no container element for label overlays.
    #[error("overlay container is missing")]
    MissingOverlayContainer,
    /// The rendering surface was already torn down.
    #[error("rendering surface is already destroyed")]
    SceneDestroyed,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to add an entity to the scene.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// The scene rejected the entity (e.g. non-finite position).
    #[error("scene rejected entity {id}: {reason}")]
    Rejected { id: String, reason: String },
    /// The rendering surface is gone.
    #[error("rendering surface destroyed")]
    Destroyed,
}

/// Failure to create or reach an overlay node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverlayError {
    #[error("overlay container not found: {0}")]
    ContainerMissing(String),
    #[error("overlay node {0} could not be created")]
    NodeCreation(String),
}

/// Elevation (or other per-vertex) lookup failure reported by the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("sample request failed: {0}")]
    Request(String),
    #[error("no data at position")]
    NoData,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a finite non-negative number, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
