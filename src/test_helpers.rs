//! Recording collaborators for unit tests.
//!
//! `MockScene` uses an identity projection: screen `(x, y)` maps to world
//! `(x, y, 0)` and back, so tests can reason in one coordinate system.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::sync::Once;

use crate::annotation::{Annotation, ObjectId, ShapeKind};
use crate::config::EngineConfig;
use crate::engine::InteractionEngine;
use crate::error::{OverlayError, SceneError};
use crate::events::Observable;
use crate::geo::{Planar, ScreenPoint, Vec3};
use crate::overlay::OverlayHost;
use crate::scene::{Picked, Scene, SceneEntity};

pub type TestEngine = InteractionEngine<MockScene, MockOverlayHost>;

static TRACING: Once = Once::new();

/// Install a debug-level subscriber that writes through the test harness.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

// =============================================================================
// SCENE
// =============================================================================

#[derive(Debug)]
pub struct MockScene {
    pub destroyed: bool,
    pub handle_layer: bool,
    pub camera_enabled: bool,
    pub camera_moving: bool,
    pub pre_render: bool,
    /// Whether clicks resolve to a world position.
    pub ground: bool,
    /// Reject every `add_entity` call.
    pub reject_adds: bool,
    pub entities: BTreeMap<String, SceneEntity>,
    /// Every id passed to `add_entity`, in order.
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub hidden_labels: HashSet<ObjectId>,
    pub picks: HashMap<(i64, i64), Vec<Picked>>,
}

impl Default for MockScene {
    fn default() -> Self {
        Self {
            destroyed: false,
            handle_layer: true,
            camera_enabled: true,
            camera_moving: false,
            pre_render: false,
            ground: true,
            reject_adds: false,
            entities: BTreeMap::new(),
            added: Vec::new(),
            removed: Vec::new(),
            hidden_labels: HashSet::new(),
            picks: HashMap::new(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn key(p: ScreenPoint) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

impl MockScene {
    /// Make `picked` (front to back) resolve at `at`.
    pub fn place(&mut self, at: ScreenPoint, picked: Vec<Picked>) {
        self.picks.insert(key(at), picked);
    }

    pub fn clear_picks(&mut self) {
        self.picks.clear();
    }

    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }
}

impl Scene for MockScene {
    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn has_handle_layer(&self) -> bool {
        self.handle_layer
    }

    fn pick(&self, screen: ScreenPoint) -> Option<Picked> {
        self.picks.get(&key(screen)).and_then(|p| p.first().cloned())
    }

    fn drill_pick(&self, screen: ScreenPoint) -> Vec<Picked> {
        self.picks.get(&key(screen)).cloned().unwrap_or_default()
    }

    fn pick_position(&self, screen: ScreenPoint) -> Option<Vec3> {
        self.ground.then(|| Vec3::new(screen.x, screen.y, 0.0))
    }

    fn world_to_screen(&self, world: Vec3) -> Option<ScreenPoint> {
        Some(ScreenPoint::new(world.x, world.y))
    }

    fn add_entity(&mut self, entity: &SceneEntity) -> Result<(), SceneError> {
        if self.reject_adds {
            return Err(SceneError::Rejected { id: entity.id.clone(), reason: "rejected by test".into() });
        }
        self.added.push(entity.id.clone());
        self.entities.insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    fn remove_entity(&mut self, id: &str) {
        self.removed.push(id.to_owned());
        self.entities.remove(id);
    }

    fn set_camera_controls_enabled(&mut self, enabled: bool) {
        self.camera_enabled = enabled;
    }

    fn is_camera_moving(&self) -> bool {
        self.camera_moving
    }

    fn set_pre_render_subscribed(&mut self, subscribed: bool) {
        self.pre_render = subscribed;
    }

    fn set_label_visible(&mut self, id: ObjectId, visible: bool) {
        if visible {
            self.hidden_labels.remove(&id);
        } else {
            self.hidden_labels.insert(id);
        }
    }
}

// =============================================================================
// OVERLAY HOST
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockNode {
    pub transform: Option<ScreenPoint>,
    pub text: String,
    pub visible: bool,
}

#[derive(Debug)]
pub struct MockOverlayHost {
    pub container: bool,
    pub fail_nodes: bool,
    pub nodes: BTreeMap<String, MockNode>,
    pub focused: Vec<String>,
}

impl Default for MockOverlayHost {
    fn default() -> Self {
        Self { container: true, fail_nodes: false, nodes: BTreeMap::new(), focused: Vec::new() }
    }
}

impl MockOverlayHost {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&MockNode> {
        self.nodes.get(id)
    }
}

impl OverlayHost for MockOverlayHost {
    fn has_container(&self) -> bool {
        self.container
    }

    fn ensure_node(&mut self, id: &str) -> Result<(), OverlayError> {
        if self.fail_nodes {
            return Err(OverlayError::NodeCreation(id.to_owned()));
        }
        self.nodes.entry(id.to_owned()).or_default();
        Ok(())
    }

    fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn set_transform(&mut self, id: &str, at: ScreenPoint) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform = Some(at);
        }
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            text.clone_into(&mut node.text);
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    fn remove_node(&mut self, id: &str) {
        self.nodes.remove(id);
    }

    fn focus_and_select_all(&mut self, id: &str) {
        self.focused.push(id.to_owned());
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub const EPS: f64 = 1e-9;

#[must_use]
pub fn v(x: f64, y: f64) -> Vec3 {
    Vec3::new(x, y, 0.0)
}

#[must_use]
pub fn sp(x: f64, y: f64) -> ScreenPoint {
    ScreenPoint::new(x, y)
}

#[must_use]
pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Engine over a planar frame with default configuration.
#[must_use]
pub fn engine() -> TestEngine {
    init_tracing();
    InteractionEngine::new(MockScene::default(), MockOverlayHost::default(), Box::new(Planar), EngineConfig::default())
        .expect("default engine should build")
}

#[must_use]
pub fn annotation(kind: ShapeKind, points: &[(f64, f64)]) -> Annotation {
    Annotation::new(ObjectId::new_v4(), kind, points.iter().map(|&(x, y)| v(x, y)).collect())
}

/// Engine with `annotations` loaded.
#[must_use]
pub fn engine_with(annotations: Vec<Annotation>) -> TestEngine {
    let mut e = engine();
    e.load_snapshot(annotations);
    e
}

/// Collect every payload emitted on `channel`.
pub fn record<T: Clone + 'static>(channel: &mut Observable<T>) -> Rc<RefCell<Vec<T>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    channel.subscribe(move |event: &T| sink.borrow_mut().push(event.clone()));
    log
}
