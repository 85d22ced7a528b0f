//! Browser overlay host backed by real DOM nodes.
//!
//! Nodes are absolutely positioned `div`s appended to a container element
//! that sits over the 3D canvas. The text editor node is `contenteditable`.

use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::error::OverlayError;
use crate::geo::ScreenPoint;
use crate::overlay::{OverlayHost, TEXT_EDITOR_NODE_ID};

pub struct WebOverlayHost {
    document: Document,
    container: Element,
    nodes: HashMap<String, HtmlElement>,
}

impl WebOverlayHost {
    /// Bind to the element with id `container_id`.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::ContainerMissing` when there is no document or
    /// no such element.
    pub fn new(container_id: &str) -> Result<Self, OverlayError> {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return Err(OverlayError::ContainerMissing(container_id.to_owned()));
        };
        let Some(container) = document.get_element_by_id(container_id) else {
            return Err(OverlayError::ContainerMissing(container_id.to_owned()));
        };
        Ok(Self { document, container, nodes: HashMap::new() })
    }

    fn create(&self, id: &str) -> Result<HtmlElement, JsValue> {
        let element = self.document.create_element("div")?;
        element.set_id(id);
        let node: HtmlElement = element.dyn_into().map_err(JsValue::from)?;
        let style = node.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", "0")?;
        style.set_property("top", "0")?;
        style.set_property("pointer-events", "none")?;
        if id == TEXT_EDITOR_NODE_ID {
            node.set_content_editable("true");
            style.set_property("pointer-events", "auto")?;
        }
        self.container.append_child(&node)?;
        Ok(node)
    }

    fn select_all(&self, node: &HtmlElement) -> Result<(), JsValue> {
        node.focus()?;
        let Some(selection) = web_sys::window().map(|w| w.get_selection()).transpose()?.flatten() else {
            return Ok(());
        };
        let range = self.document.create_range()?;
        range.select_node_contents(node)?;
        selection.remove_all_ranges()?;
        selection.add_range(&range)
    }
}

impl OverlayHost for WebOverlayHost {
    fn has_container(&self) -> bool {
        self.container.is_connected()
    }

    fn ensure_node(&mut self, id: &str) -> Result<(), OverlayError> {
        if self.nodes.contains_key(id) {
            return Ok(());
        }
        let node = self.create(id).map_err(|e| OverlayError::NodeCreation(format!("{id}: {e:?}")))?;
        self.nodes.insert(id.to_owned(), node);
        Ok(())
    }

    fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn set_transform(&mut self, id: &str, at: ScreenPoint) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let value = format!("translate({:.1}px, {:.1}px)", at.x, at.y);
        if let Err(e) = node.style().set_property("transform", &value) {
            tracing::debug!(node = id, error = ?e, "transform not applied");
        }
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(node) = self.nodes.get(id) {
            if node.text_content().as_deref() != Some(text) {
                node.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let display = if visible { "" } else { "none" };
        if let Err(e) = node.style().set_property("display", display) {
            tracing::debug!(node = id, error = ?e, "visibility not applied");
        }
    }

    fn remove_node(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            node.remove();
        }
    }

    fn focus_and_select_all(&mut self, id: &str) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if let Err(e) = self.select_all(node) {
            tracing::debug!(node = id, error = ?e, "focus/select-all failed");
        }
    }
}
