//! Scene-graph port.
//!
//! The chart never talks to the DOM directly. Everything it draws goes
//! through [`SceneGraph`], implemented by the retained in-memory scene and
//! by the browser DOM backend in `infrastructure::rendering`.

use derive_more::{Display, From, Into};
use std::rc::Rc;
use strum::{AsRefStr, IntoStaticStr};

use super::animation::Transition;
use super::interaction::PointerHandler;
use crate::domain::errors::ChartResult;

/// Attribute carrying the binding key of a data-bound node.
pub const DATA_KEY_ATTR: &str = "data-key";

/// Handle to a node owned by a scene backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into, Display)]
#[display(fmt = "node#{}", _0)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum NodeKind {
    #[strum(serialize = "svg")]
    Svg,
    #[strum(serialize = "g")]
    Group,
    #[strum(serialize = "rect")]
    Rect,
    #[strum(serialize = "line")]
    Line,
    #[strum(serialize = "path")]
    Path,
    #[strum(serialize = "text")]
    Text,
    #[strum(serialize = "div")]
    Div,
}

impl NodeKind {
    pub fn tag(&self) -> &str {
        self.as_ref()
    }

    /// Whether the node lives in the SVG namespace.
    pub fn is_svg(&self) -> bool {
        !matches!(self, NodeKind::Div)
    }
}

/// Measured content box of a container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
pub enum PointerEventKind {
    #[strum(serialize = "mouseenter")]
    Enter,
    #[strum(serialize = "mousemove")]
    Move,
    #[strum(serialize = "mouseleave")]
    Leave,
}

impl PointerEventKind {
    /// DOM event type.
    pub fn event_name(self) -> &'static str {
        self.into()
    }
}

/// Pointer location in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait SceneGraph {
    /// Resolve a selector against the host document.
    fn select(&self, selector: &str) -> Option<NodeId>;

    fn measure(&self, node: NodeId) -> ChartResult<BoundingBox>;

    fn create_node(&mut self, kind: NodeKind) -> ChartResult<NodeId>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()>;

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()>;

    /// Current inline style value, including one written by a running transition.
    fn style_value(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_text(&mut self, node: NodeId, text: &str) -> ChartResult<()>;

    fn clear_children(&mut self, node: NodeId) -> ChartResult<()>;

    /// Detach `node` (and its subtree) from its parent.
    fn remove_node(&mut self, node: NodeId) -> ChartResult<()>;

    /// Indices of `keys` with no child of `parent` carrying `class` and a
    /// matching [`DATA_KEY_ATTR`]: the entering part of a keyed join.
    fn bind_data_by_key(&self, parent: NodeId, class: &str, keys: &[String]) -> ChartResult<Vec<usize>>;

    /// Start a transition on `node`, interrupting any running one.
    fn run_transition(&mut self, node: NodeId, transition: Transition) -> ChartResult<()>;

    fn cancel_transitions(&mut self, node: NodeId);

    fn attach_pointer_handler(&mut self, node: NodeId, handler: Rc<dyn PointerHandler>) -> ChartResult<()>;

    /// Create a node, tag it with `class` and append it to `parent`.
    fn append_new(&mut self, parent: NodeId, kind: NodeKind, class: Option<&str>) -> ChartResult<NodeId> {
        let node = self.create_node(kind)?;
        if let Some(class) = class {
            self.set_attribute(node, "class", class)?;
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    fn set_numeric_attributes(&mut self, node: NodeId, attrs: &[(&str, f64)]) -> ChartResult<()> {
        for (name, value) in attrs {
            self.set_attribute(node, name, &format_number(*value))?;
        }
        Ok(())
    }
}

impl<S: SceneGraph + ?Sized> SceneGraph for &mut S {
    fn select(&self, selector: &str) -> Option<NodeId> {
        (**self).select(selector)
    }

    fn measure(&self, node: NodeId) -> ChartResult<BoundingBox> {
        (**self).measure(node)
    }

    fn create_node(&mut self, kind: NodeKind) -> ChartResult<NodeId> {
        (**self).create_node(kind)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()> {
        (**self).append_child(parent, child)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        (**self).set_attribute(node, name, value)
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) -> ChartResult<()> {
        (**self).set_style(node, name, value)
    }

    fn style_value(&self, node: NodeId, name: &str) -> Option<String> {
        (**self).style_value(node, name)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> ChartResult<()> {
        (**self).set_text(node, text)
    }

    fn clear_children(&mut self, node: NodeId) -> ChartResult<()> {
        (**self).clear_children(node)
    }

    fn remove_node(&mut self, node: NodeId) -> ChartResult<()> {
        (**self).remove_node(node)
    }

    fn bind_data_by_key(&self, parent: NodeId, class: &str, keys: &[String]) -> ChartResult<Vec<usize>> {
        (**self).bind_data_by_key(parent, class, keys)
    }

    fn run_transition(&mut self, node: NodeId, transition: Transition) -> ChartResult<()> {
        (**self).run_transition(node, transition)
    }

    fn cancel_transitions(&mut self, node: NodeId) {
        (**self).cancel_transitions(node)
    }

    fn attach_pointer_handler(&mut self, node: NodeId, handler: Rc<dyn PointerHandler>) -> ChartResult<()> {
        (**self).attach_pointer_handler(node, handler)
    }
}

/// Attribute formatting for pixel values: integral values without a fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// `translate(x,y)` transform attribute value.
pub fn translate(x: f64, y: f64) -> String {
    format!("translate({},{})", format_number(x), format_number(y))
}
