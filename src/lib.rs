//! Interactive geometry-editing engine for annotations over a 3D terrain view.
//!
//! The crate owns pointer-input routing, drawing-mode progression, the
//! selection/hover lifecycle, drag-editing of vertices and rotation handles,
//! and per-frame placement of screen-space label overlays. It never renders:
//! the host scene is reached through the [`scene::Scene`] trait, overlay DOM
//! nodes through [`overlay::OverlayHost`], and results are published as
//! events on [`engine::InteractionEngine::events`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | `InteractionEngine`: construction, input routing, rendered precedence, teardown |
//! | [`drawing`] | Drawing state machine: vertex collection, snapping, completion |
//! | [`selection`] | Selection and hover transitions |
//! | [`drag`] | Drag/edit engine and geometry commit |
//! | [`overlay`] | Overlay synchronizer and text editor overlay |
//! | [`handles`] | Editing handle layer |
//! | [`cache`] | Per-object elevation and distance cache |
//! | [`events`] | Observable event channels and payloads |
//! | [`input`] | Pointer input types and the shared interaction state |
//! | [`annotation`] | Shape kinds, capability table, annotation mirror |
//! | [`scene`] | Rendering collaborator boundary |
//! | [`geo`] | World/screen points and the geometry collaborator |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (snap threshold, label offsets, etc.) |
//! | `dom` | `web-sys` overlay host (feature `web`) |

pub mod annotation;
pub mod cache;
pub mod config;
pub mod consts;
pub mod drag;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod handles;
pub mod input;
pub mod overlay;
pub mod scene;
pub mod selection;

#[cfg(feature = "web")]
pub mod dom;

#[cfg(test)]
pub(crate) mod test_helpers;
