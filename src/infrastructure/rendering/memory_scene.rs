//! Retained in-memory scene.
//!
//! Mirrors what the DOM backend does without a browser: nodes keep their
//! attributes and styles in insertion order, transitions advance on an
//! explicit clock and pointer events are delivered by hand. The tree can be
//! serialized to SVG/HTML markup.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::rc::Rc;

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
};

struct MemoryNode {
    kind: NodeKind,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    handler: Option<Rc<dyn PointerHandler>>,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            styles: Vec::new(),
            text: None,
            children: Vec::new(),
            parent: None,
            handler: None,
        }
    }

    fn has_class(&self, class: &str) -> bool {
        lookup(&self.attributes, "class").is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

struct RunningTransition {
    transition: Transition,
    elapsed_ms: f64,
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn upsert(pairs: &mut Vec<(String, String)>, name: &str, value: &str) {
    match pairs.iter_mut().find(|(k, _)| k == name) {
        Some((_, v)) => *v = value.to_string(),
        None => pairs.push((name.to_string(), value.to_string())),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[derive(Default)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, MemoryNode>,
    next_id: usize,
    containers: HashMap<String, NodeId>,
    bounds: HashMap<NodeId, BoundingBox>,
    transitions: BTreeMap<NodeId, RunningTransition>,
    mutations: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene with a single container of the given size.
    pub fn with_container(selector: &str, width: f64, height: f64) -> Self {
        let mut scene = Self::new();
        scene.add_container(selector, width, height);
        scene
    }

    /// Register a host container. Not counted as a mutation.
    pub fn add_container(&mut self, selector: &str, width: f64, height: f64) -> NodeId {
        let id = self.allocate(NodeKind::Div);
        self.containers.insert(selector.to_string(), id);
        self.bounds.insert(id, BoundingBox::new(width, height));
        id
    }

    /// Nodes created by the chart and not yet removed, containers excluded.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.containers.len()
    }

    /// Number of mutating calls received so far.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn running_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_transitioning(&self, node: NodeId) -> bool {
        self.transitions.contains_key(&node)
    }

    /// Move the transition clock forward, applying every running tween.
    pub fn advance(&mut self, ms: f64) {
        let mut frames = Vec::new();
        for (node, running) in self.transitions.iter_mut() {
            running.elapsed_ms += ms;
            let values: Vec<(TweenTarget, &'static str, f64)> = running
                .transition
                .sample(running.elapsed_ms)
                .into_iter()
                .map(|(tween, value)| (tween.target, tween.name, value))
                .collect();
            frames.push((*node, values));
        }
        for (node, values) in frames {
            self.apply_values(node, &values);
        }
        self.transitions.retain(|_, r| !r.transition.is_complete(r.elapsed_ms));
    }

    /// Run every transition to its end.
    pub fn finish(&mut self) {
        let longest = self.transitions.values().map(|r| r.transition.duration_ms).fold(0.0, f64::max);
        self.advance(longest);
    }

    /// Deliver a pointer event to the handler attached to `node`.
    /// Returns `false` when the node has no handler.
    pub fn dispatch_pointer(
        &mut self,
        node: NodeId,
        kind: PointerEventKind,
        position: PointerPosition,
    ) -> ChartResult<bool> {
        let Some(handler) = self.node(node)?.handler.clone() else {
            return Ok(false);
        };
        handler.dispatch(kind, position).apply(self, handler.tooltip())?;
        Ok(true)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| lookup(&n.attributes, name))
    }

    pub fn numeric_attribute(&self, node: NodeId, name: &str) -> Option<f64> {
        self.attribute(node, name).and_then(|v| v.parse().ok())
    }

    pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| lookup(&n.styles, name))
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| n.text.as_deref())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn has_handler(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.handler.is_some())
    }

    /// Attached nodes carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self.containers.values().copied().collect();
        roots.sort();
        let mut found = Vec::new();
        for root in roots {
            self.collect_class(root, class, &mut found);
        }
        found
    }

    /// First attached node carrying `class`.
    pub fn first_of_class(&self, class: &str) -> Option<NodeId> {
        self.query_class(class).into_iter().next()
    }

    /// Serialize `node` and its subtree.
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn collect_class(&self, node: NodeId, class: &str, found: &mut Vec<NodeId>) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        if n.has_class(class) {
            found.push(node);
        }
        for child in &n.children {
            self.collect_class(*child, class, found);
        }
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        let tag = n.kind.tag();
        let _ = write!(out, "<{}", tag);
        for (name, value) in &n.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if !n.styles.is_empty() {
            let style: Vec<String> = n.styles.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
            let _ = write!(out, " style=\"{}\"", escape(&style.join("; ")));
        }
        out.push('>');
        if let Some(text) = &n.text {
            out.push_str(&escape(text));
        }
        for child in &n.children {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", tag);
    }

    fn apply_values(&mut self, node: NodeId, values: &[(TweenTarget, &'static str, f64)]) {
        if let Some(n) = self.nodes.get_mut(&node) {
            for (target, name, value) in values {
                let pairs = match target {
                    TweenTarget::Attribute => &mut n.attributes,
                    TweenTarget::Style => &mut n.styles,
                };
                upsert(pairs, name, &format_number(*value));
            }
        }
    }

    fn node(&self, node: NodeId) -> ChartResult<&MemoryNode> {
        self.nodes.get(&node).ok_or_else(|| ChartError::rendering(format!("unknown {}", node)))
    }

    fn node_mut(&mut self, node: NodeId) -> ChartResult<&mut MemoryNode> {
        self.mutations += 1;
        self.nodes.get_mut(&node).ok_or_else(|| ChartError::rendering(format!("unknown {}", node)))
    }

    fn detach(&mut self, node: NodeId) -> ChartResult<()> {
        if let Some(parent) = self.node_mut(node)?.parent.take() {
            self.node_mut(parent)?.children.retain(|c| *c != node);
        }
        Ok(())
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, MemoryNode::new(kind));
        id
    }

    /// Drop `node` and everything below it, with their transitions and handlers.
    fn release(&mut self, node: NodeId) {
        for n in self.subtree(node) {
            self.nodes.remove(&n);
            self.transitions.remove(&n);
            self.bounds.remove(&n);
            self.containers.retain(|_, id| *id != n);
        }
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut all = vec![node];
        let mut i = 0;
        while i < all.len() {
            let current = all[i];
            all.extend_from_slice(self.children(current));
            i += 1;
        }
        all
    }
}

impl SceneGraph for MemoryScene {
    fn select(&self, selector: &str) -> Option<NodeId> {
        self.containers.get(selector).copied()
    }

    fn measure(&self, node: NodeId) -> ChartResult<BoundingBox> {
        if let Some(bounds) = self.bounds.get(&node) {
            return Ok(*bounds);
        }
        match (self.numeric_attribute(node, "width"), self.numeric_attribute(node, "height")) {
            (Some(w), Some(h)) => Ok(BoundingBox::new(w, h)),
            _ => Err(ChartError::rendering(format!("{} has no measurable size", node))),
        }
    }

    fn create_node(&mut self, kind: NodeKind) -> ChartResult<NodeId> {
        self.mutations += 1;
        Ok(self.allocate(kind))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        upsert(&mut self.node_mut(node)?.attributes, name, value);
        Ok(())
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        upsert(&mut self.node_mut(node)?.styles, name, value);
        Ok(())
    }

    fn style_value(&self, node: NodeId, name: &str) -> Option<String> {
        self.style(node, name).map(str::to_string)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> ChartResult<()> {
        self.node_mut(node)?.text = Some(text.to_string());
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> ChartResult<()> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            self.release(child);
        }
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> ChartResult<()> {
        self.detach(node)?;
        self.release(node);
        Ok(())
    }

    fn bind_data_by_key(&self, parent: NodeId, class: &str, keys: &[String]) -> ChartResult<Vec<usize>> {
        let bound: Vec<&str> = self
            .node(parent)?
            .children
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .filter(|n| n.has_class(class))
            .filter_map(|n| lookup(&n.attributes, DATA_KEY_ATTR))
            .collect();
        Ok(keys
            .iter()
            .enumerate()
            .filter(|(_, key)| !bound.contains(&key.as_str()))
            .map(|(i, _)| i)
            .collect())
    }

    fn run_transition(&mut self, node: NodeId, transition: Transition) -> ChartResult<()> {
        self.node_mut(node)?;
        self.transitions.insert(node, RunningTransition { transition, elapsed_ms: 0.0 });
        Ok(())
    }

    fn cancel_transitions(&mut self, node: NodeId) {
        self.transitions.remove(&node);
    }

    fn attach_pointer_handler(&mut self, node: NodeId, handler: Rc<dyn PointerHandler>) -> ChartResult<()> {
        self.node_mut(node)?.handler = Some(handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::animation::{Easing, Tween};

    #[test]
    fn select_and_measure_registered_containers() {
        let scene = MemoryScene::with_container("#chart", 640.0, 480.0);
        let root = scene.select("#chart").unwrap();
        assert_eq!(scene.measure(root).unwrap(), BoundingBox::new(640.0, 480.0));
        assert_eq!(scene.select("#missing"), None);
        assert_eq!(scene.live_nodes(), 0);
        assert_eq!(scene.mutations(), 0);
    }

    #[test]
    fn markup_keeps_insertion_order() {
        let mut scene = MemoryScene::with_container("#c", 10.0, 10.0);
        let root = scene.select("#c").unwrap();
        let g = scene.append_new(root, NodeKind::Group, Some("layer")).unwrap();
        let rect = scene.append_new(g, NodeKind::Rect, None).unwrap();
        scene.set_numeric_attributes(rect, &[("x", 1.0), ("y", 2.5)]).unwrap();
        scene.set_style(rect, "fill", "red").unwrap();

        insta::assert_snapshot!(
            scene.to_markup(g),
            @r#"<g class="layer"><rect x="1" y="2.5" style="fill: red"></rect></g>"#
        );
        assert_eq!(scene.query_class("layer"), vec![g]);
    }

    #[test]
    fn transitions_interrupt_and_complete() {
        let mut scene = MemoryScene::with_container("#c", 10.0, 10.0);
        let root = scene.select("#c").unwrap();
        let rect = scene.append_new(root, NodeKind::Rect, None).unwrap();

        let slow = Transition::new(100.0, Easing::Linear).with_tween(Tween::attr("y", 0.0, 100.0));
        scene.run_transition(rect, slow).unwrap();
        scene.advance(50.0);
        assert_eq!(scene.attribute(rect, "y"), Some("50"));

        let fast = Transition::new(10.0, Easing::Linear).with_tween(Tween::attr("y", 50.0, 0.0));
        scene.run_transition(rect, fast).unwrap();
        scene.advance(10.0);
        assert_eq!(scene.attribute(rect, "y"), Some("0"));
        assert_eq!(scene.running_transitions(), 0);
    }

    #[test]
    fn removed_nodes_leave_queries() {
        let mut scene = MemoryScene::with_container("#c", 10.0, 10.0);
        let root = scene.select("#c").unwrap();
        let g = scene.append_new(root, NodeKind::Group, Some("layer")).unwrap();
        scene.append_new(g, NodeKind::Rect, Some("candle-body")).unwrap();
        assert_eq!(scene.query_class("candle-body").len(), 1);

        assert_eq!(scene.parent(g), Some(root));
        assert_eq!(scene.live_nodes(), 2);

        scene.remove_node(g).unwrap();
        assert!(scene.query_class("candle-body").is_empty());
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.live_nodes(), 0);
        assert!(scene.set_attribute(g, "x", "1").is_err());
    }

    #[test]
    fn cleared_children_release_transitions_and_handlers() {
        let mut scene = MemoryScene::with_container("#c", 10.0, 10.0);
        let root = scene.select("#c").unwrap();
        let g = scene.append_new(root, NodeKind::Group, None).unwrap();
        let rect = scene.append_new(g, NodeKind::Rect, None).unwrap();
        let fade = Transition::new(10.0, Easing::Linear).with_tween(Tween::style("opacity", 0.0, 1.0));
        scene.run_transition(rect, fade).unwrap();
        assert!(scene.is_transitioning(rect));

        scene.clear_children(root).unwrap();
        assert!(!scene.is_transitioning(rect));
        assert_eq!(scene.running_transitions(), 0);
        assert_eq!(scene.live_nodes(), 0);
        assert!(!scene.has_handler(rect));
    }

    #[test]
    fn keyed_binding_skips_bound_keys() {
        let mut scene = MemoryScene::with_container("#c", 10.0, 10.0);
        let root = scene.select("#c").unwrap();
        let rect = scene.append_new(root, NodeKind::Rect, Some("candle-body")).unwrap();
        scene.set_attribute(rect, DATA_KEY_ATTR, "1").unwrap();

        let keys = vec!["0".to_string(), "1".to_string(), "2".to_string()];
        assert_eq!(scene.bind_data_by_key(root, "candle-body", &keys).unwrap(), vec![0, 2]);
        assert_eq!(scene.bind_data_by_key(root, "candle-wick", &keys).unwrap(), vec![0, 1, 2]);
    }
}
