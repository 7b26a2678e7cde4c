use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, MouseEvent, SvgElement};

use crate::domain::{
    chart::{
        Transition,
        animation::TweenTarget,
        interaction::PointerHandler,
        scene::{
            BoundingBox, DATA_KEY_ATTR, NodeId, NodeKind, PointerEventKind, PointerPosition, SceneGraph,
            format_number,
        },
    },
    errors::{ChartError, ChartResult},
    logging::LogComponent,
};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn dom_error(context: &str, err: JsValue) -> ChartError {
    ChartError::rendering(format!("{}: {:?}", context, err))
}

struct RunningTransition {
    transition: Transition,
    /// rAF timestamp of the first frame, set lazily.
    started_at: Option<f64>,
}

/// One registered element with the tree links and listeners owned for it.
struct DomNode {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<EventListener>,
}

impl DomNode {
    fn new(element: Element) -> Self {
        Self { element, parent: None, children: Vec::new(), listeners: Vec::new() }
    }
}

struct DomInner {
    document: Document,
    nodes: HashMap<NodeId, DomNode>,
    next_id: usize,
    selected: HashMap<String, NodeId>,
    transitions: HashMap<NodeId, RunningTransition>,
    frame: Option<AnimationFrame>,
}

impl DomInner {
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut all = vec![node];
        let mut i = 0;
        while i < all.len() {
            if let Some(n) = self.nodes.get(&all[i]) {
                let children = n.children.clone();
                all.extend(children);
            }
            i += 1;
        }
        all
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Forget `node` and its subtree. Dropping the listeners unregisters them.
    fn release(&mut self, node: NodeId) -> Vec<DomNode> {
        let mut dropped = Vec::new();
        for n in self.subtree(node) {
            self.transitions.remove(&n);
            self.selected.retain(|_, id| *id != n);
            if let Some(slot) = self.nodes.remove(&n) {
                dropped.push(slot);
            }
        }
        dropped
    }
}

/// Scene backed by the browser DOM.
///
/// Clones share the same node table, so pointer listeners and the frame
/// loop can write back into the scene.
#[derive(Clone)]
pub struct DomScene {
    inner: Rc<RefCell<DomInner>>,
}

impl DomScene {
    pub fn new() -> ChartResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ChartError::configuration("no browser document available"))?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DomInner {
                document,
                nodes: HashMap::new(),
                next_id: 0,
                selected: HashMap::new(),
                transitions: HashMap::new(),
                frame: None,
            })),
        }
    }

    /// Underlying element of a node handle.
    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.inner.borrow().nodes.get(&node).map(|n| n.element.clone())
    }

    /// Elements currently tracked by the scene.
    pub fn live_nodes(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    fn register(&self, element: Element) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId::from(inner.next_id);
        inner.next_id += 1;
        inner.nodes.insert(id, DomNode::new(element));
        id
    }

    fn get(&self, node: NodeId) -> ChartResult<Element> {
        self.element(node).ok_or_else(|| ChartError::rendering(format!("unknown {}", node)))
    }

    fn style_of(element: &Element) -> Option<CssStyleDeclaration> {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            Some(html.style())
        } else {
            element.dyn_ref::<SvgElement>().map(|svg| svg.style())
        }
    }

    fn apply_style(element: &Element, name: &str, value: &str) -> ChartResult<()> {
        let style = Self::style_of(element).ok_or_else(|| ChartError::rendering("element has no inline style"))?;
        style.set_property(name, value).map_err(|e| dom_error("set_property", e))
    }

    fn ensure_frame(&self) {
        let weak = Rc::downgrade(&self.inner);
        let mut inner = self.inner.borrow_mut();
        if inner.frame.is_none() && !inner.transitions.is_empty() {
            inner.frame = Some(request_animation_frame(move |ts| Self::on_frame(&weak, ts)));
        }
    }

    fn on_frame(weak: &Weak<RefCell<DomInner>>, timestamp: f64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let scene = DomScene { inner };
        scene.inner.borrow_mut().frame = None;
        if let Err(e) = scene.tick(timestamp) {
            crate::log_error!(LogComponent::Infrastructure("DomScene"), "frame failed: {}", e);
        }
        scene.ensure_frame();
    }

    fn tick(&self, timestamp: f64) -> ChartResult<()> {
        let mut inner = self.inner.borrow_mut();
        let mut updates = Vec::new();
        for (node, running) in inner.transitions.iter_mut() {
            let started = *running.started_at.get_or_insert(timestamp);
            let elapsed = timestamp - started;
            for (tween, value) in running.transition.sample(elapsed) {
                updates.push((*node, tween.target, tween.name, value));
            }
        }
        inner.transitions.retain(|_, r| {
            let elapsed = r.started_at.map_or(0.0, |s| timestamp - s);
            !r.transition.is_complete(elapsed)
        });

        for (node, target, name, value) in updates {
            let Some(slot) = inner.nodes.get(&node) else {
                continue;
            };
            let value = format_number(value);
            match target {
                TweenTarget::Attribute => {
                    slot.element.set_attribute(name, &value).map_err(|e| dom_error("set_attribute", e))?
                }
                TweenTarget::Style => Self::apply_style(&slot.element, name, &value)?,
            }
        }
        Ok(())
    }
}

impl SceneGraph for DomScene {
    fn select(&self, selector: &str) -> Option<NodeId> {
        let element = self.inner.borrow().document.query_selector(selector).ok().flatten()?;
        let cached = {
            let inner = self.inner.borrow();
            inner
                .selected
                .get(selector)
                .copied()
                .filter(|id| inner.nodes.get(id).is_some_and(|n| n.element == element))
        };
        if cached.is_some() {
            return cached;
        }
        let id = self.register(element);
        self.inner.borrow_mut().selected.insert(selector.to_string(), id);
        Some(id)
    }

    fn measure(&self, node: NodeId) -> ChartResult<BoundingBox> {
        let rect = self.get(node)?.get_bounding_client_rect();
        Ok(BoundingBox::new(rect.width(), rect.height()))
    }

    fn create_node(&mut self, kind: NodeKind) -> ChartResult<NodeId> {
        let element = {
            let inner = self.inner.borrow();
            if kind.is_svg() {
                inner.document.create_element_ns(Some(SVG_NS), kind.tag())
            } else {
                inner.document.create_element(kind.tag())
            }
        }
        .map_err(|e| dom_error("create_element", e))?;
        Ok(self.register(element))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()> {
        let child_element = self.get(child)?;
        self.get(parent)?.append_child(&child_element).map_err(|e| dom_error("append_child", e))?;

        let mut inner = self.inner.borrow_mut();
        inner.detach(child);
        if let Some(slot) = inner.nodes.get_mut(&child) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = inner.nodes.get_mut(&parent) {
            slot.children.push(child);
        }
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        self.get(node)?.set_attribute(name, value).map_err(|e| dom_error("set_attribute", e))
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        Self::apply_style(&self.get(node)?, name, value)
    }

    fn style_value(&self, node: NodeId, name: &str) -> Option<String> {
        let element = self.element(node)?;
        Self::style_of(&element)
            .and_then(|style| style.get_property_value(name).ok())
            .filter(|value| !value.is_empty())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> ChartResult<()> {
        self.get(node)?.set_text_content(Some(text));
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> ChartResult<()> {
        let element = self.get(node)?;
        while let Some(child) = element.first_child() {
            element.remove_child(&child).map_err(|e| dom_error("remove_child", e))?;
        }

        let dropped = {
            let mut inner = self.inner.borrow_mut();
            let children = inner.nodes.get_mut(&node).map(|n| std::mem::take(&mut n.children)).unwrap_or_default();
            children.into_iter().flat_map(|child| inner.release(child)).collect::<Vec<_>>()
        };
        drop(dropped);
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> ChartResult<()> {
        self.get(node)?.remove();
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            inner.detach(node);
            inner.release(node)
        };
        drop(dropped);
        Ok(())
    }

    fn bind_data_by_key(&self, parent: NodeId, class: &str, keys: &[String]) -> ChartResult<Vec<usize>> {
        let children = self.get(parent)?.children();
        let bound: Vec<String> = (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|el| el.class_list().contains(class))
            .filter_map(|el| el.get_attribute(DATA_KEY_ATTR))
            .collect();
        Ok(keys.iter().enumerate().filter(|(_, key)| !bound.contains(key)).map(|(i, _)| i).collect())
    }

    fn run_transition(&mut self, node: NodeId, transition: Transition) -> ChartResult<()> {
        self.get(node)?;
        self.inner
            .borrow_mut()
            .transitions
            .insert(node, RunningTransition { transition, started_at: None });
        self.ensure_frame();
        Ok(())
    }

    fn cancel_transitions(&mut self, node: NodeId) {
        self.inner.borrow_mut().transitions.remove(&node);
    }

    fn attach_pointer_handler(&mut self, node: NodeId, handler: Rc<dyn PointerHandler>) -> ChartResult<()> {
        let element = self.get(node)?;
        let listeners: Vec<EventListener> = [PointerEventKind::Enter, PointerEventKind::Move, PointerEventKind::Leave]
            .into_iter()
            .map(|kind| {
                let weak = Rc::downgrade(&self.inner);
                let handler = handler.clone();
                EventListener::new(&element, kind.event_name(), move |event| {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    let position = event
                        .dyn_ref::<MouseEvent>()
                        .map(|m| PointerPosition::new(m.page_x() as f64, m.page_y() as f64))
                        .unwrap_or_default();
                    let mut scene = DomScene { inner };
                    if let Err(e) = handler.dispatch(kind, position).apply(&mut scene, handler.tooltip()) {
                        crate::log_error!(LogComponent::Infrastructure("DomScene"), "pointer handler failed: {}", e);
                    }
                })
            })
            .collect();

        let replaced = self
            .inner
            .borrow_mut()
            .nodes
            .get_mut(&node)
            .map(|slot| std::mem::replace(&mut slot.listeners, listeners));
        drop(replaced);
        Ok(())
    }
}
