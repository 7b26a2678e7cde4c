use std::rc::Rc;

use crate::domain::{
    chart::{
        CandleGeometry, CandleHoverHandler, EnterAnimation, Layout, NodeId, NodeKind, RedrawPolicy, SceneClass,
        SceneGraph,
        scales::DEFAULT_TICK_COUNT,
        scene::{DATA_KEY_ATTR, translate},
    },
    errors::ChartResult,
    logging::LogComponent,
    state::ChartState,
};

/// Length of axis tick marks.
pub const TICK_SIZE: f64 = 6.0;
/// Distance between a tick mark and its label.
pub const TICK_PADDING: f64 = 3.0;

/// Nodes created once at construction and kept for the chart's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneNodes {
    pub container: NodeId,
    pub svg: NodeId,
    pub grid: NodeId,
    pub axis: NodeId,
    pub x_axis: NodeId,
    pub y_axis: NodeId,
    pub chart: NodeId,
    pub tooltip: NodeId,
}

impl SceneNodes {
    /// Build the persistent skeleton inside `container`.
    pub fn mount<S: SceneGraph + ?Sized>(scene: &mut S, container: NodeId, layout: &Layout) -> ChartResult<Self> {
        let margin = layout.margin;
        let offset = translate(margin.left, margin.top);

        let svg = scene.append_new(container, NodeKind::Svg, Some(SceneClass::Svg.name()))?;
        scene.set_numeric_attributes(svg, &[("width", layout.outer_width()), ("height", layout.outer_height())])?;

        let grid = scene.append_new(svg, NodeKind::Group, Some(SceneClass::GridGroup.name()))?;
        scene.set_attribute(grid, "transform", &offset)?;

        let axis = scene.append_new(svg, NodeKind::Group, Some(SceneClass::AxisGroup.name()))?;
        scene.set_attribute(axis, "transform", &offset)?;
        let x_axis = scene.append_new(axis, NodeKind::Group, Some(SceneClass::XAxis.name()))?;
        scene.set_attribute(x_axis, "transform", &translate(0.0, layout.height))?;
        let y_axis = scene.append_new(axis, NodeKind::Group, Some(SceneClass::YAxis.name()))?;
        scene.set_attribute(y_axis, "transform", &translate(layout.width, 0.0))?;

        let chart = scene.append_new(svg, NodeKind::Group, Some(SceneClass::ChartGroup.name()))?;
        scene.set_attribute(chart, "transform", &offset)?;
        scene.set_numeric_attributes(chart, &[("width", layout.width), ("height", layout.height)])?;

        let tooltip = scene.append_new(container, NodeKind::Div, Some(SceneClass::Tooltip.name()))?;
        for (name, value) in [
            ("position", "absolute"),
            ("pointer-events", "none"),
            ("white-space", "pre-line"),
            ("opacity", "0"),
        ] {
            scene.set_style(tooltip, name, value)?;
        }

        Ok(Self { container, svg, grid, axis, x_axis, y_axis, chart, tooltip })
    }
}

/// Candle layer drawn by one load
#[derive(Debug, Clone, PartialEq, Eq)]
struct CandleLayer {
    group: NodeId,
    nodes: Vec<NodeId>,
}

/// Draws grid, axes and candles of a [`ChartState`] into the scene.
#[derive(Debug)]
pub struct SceneRenderer {
    nodes: SceneNodes,
    layout: Layout,
    redraw: RedrawPolicy,
    layers: Vec<CandleLayer>,
}

impl SceneRenderer {
    pub fn new(nodes: SceneNodes, layout: Layout, redraw: RedrawPolicy) -> Self {
        Self { nodes, layout, redraw, layers: Vec::new() }
    }

    pub fn nodes(&self) -> &SceneNodes {
        &self.nodes
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn render<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        state: &ChartState,
        candles: &[CandleGeometry],
    ) -> ChartResult<()> {
        self.draw_grid(scene, state)?;
        self.draw_axes(scene, state)?;
        if self.redraw == RedrawPolicy::Replace {
            self.drop_layers(scene)?;
        }
        self.draw_candles(scene, state, candles)?;

        crate::log_debug!(
            LogComponent::Application("SceneRenderer"),
            "generation {}: {} candles, {} layer(s)",
            state.generation,
            candles.len(),
            self.layers.len()
        );
        Ok(())
    }

    fn draw_grid<S: SceneGraph + ?Sized>(&self, scene: &mut S, state: &ChartState) -> ChartResult<()> {
        let grid = self.nodes.grid;
        let (width, height) = (self.layout.width, self.layout.height);
        scene.clear_children(grid)?;

        for tick in state.scales.y.ticks(DEFAULT_TICK_COUNT) {
            let y = state.scales.y.scale(tick);
            self.gridline(scene, grid, [("x1", 0.0), ("x2", width), ("y1", y), ("y2", y)])?;
        }
        for tick in state.scales.x.ticks(DEFAULT_TICK_COUNT) {
            let x = state.scales.x.scale(tick);
            self.gridline(scene, grid, [("x1", x), ("x2", x), ("y1", 0.0), ("y2", height)])?;
        }
        Ok(())
    }

    fn gridline<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        grid: NodeId,
        coords: [(&str, f64); 4],
    ) -> ChartResult<()> {
        let line = scene.append_new(grid, NodeKind::Line, Some(SceneClass::Gridline.name()))?;
        scene.set_numeric_attributes(line, &coords)?;
        scene.set_attribute(line, "stroke", "lightgrey")?;
        scene.set_attribute(line, "stroke-opacity", "0.7")?;
        scene.set_attribute(line, "shape-rendering", "crispEdges")
    }

    fn draw_axes<S: SceneGraph + ?Sized>(&self, scene: &mut S, state: &ChartState) -> ChartResult<()> {
        let (width, height) = (self.layout.width, self.layout.height);
        let scales = &state.scales;

        // bottom time axis
        let x_axis = self.nodes.x_axis;
        scene.clear_children(x_axis)?;
        self.axis_domain(scene, x_axis, &format!("M0,{}V0H{}V{}", TICK_SIZE, width, TICK_SIZE))?;
        for tick in scales.x.ticks(DEFAULT_TICK_COUNT) {
            let label = scales.x.format_tick(tick, DEFAULT_TICK_COUNT);
            let (mark, text) = self.axis_tick(scene, x_axis, translate(scales.x.scale(tick), 0.0), &label)?;
            scene.set_numeric_attributes(mark, &[("y2", TICK_SIZE)])?;
            scene.set_numeric_attributes(text, &[("y", TICK_SIZE + TICK_PADDING)])?;
            scene.set_attribute(text, "dy", "0.71em")?;
            scene.set_attribute(text, "text-anchor", "middle")?;
        }

        // right price axis
        let y_axis = self.nodes.y_axis;
        scene.clear_children(y_axis)?;
        self.axis_domain(scene, y_axis, &format!("M{},{}H0V0H{}", TICK_SIZE, height, TICK_SIZE))?;
        for tick in scales.y.ticks(DEFAULT_TICK_COUNT) {
            let label = scales.y.format_tick(tick, DEFAULT_TICK_COUNT);
            let (mark, text) = self.axis_tick(scene, y_axis, translate(0.0, scales.y.scale(tick)), &label)?;
            scene.set_numeric_attributes(mark, &[("x2", TICK_SIZE)])?;
            scene.set_numeric_attributes(text, &[("x", TICK_SIZE + TICK_PADDING)])?;
            scene.set_attribute(text, "dy", "0.32em")?;
            scene.set_attribute(text, "text-anchor", "start")?;
        }
        Ok(())
    }

    fn axis_domain<S: SceneGraph + ?Sized>(&self, scene: &mut S, axis: NodeId, d: &str) -> ChartResult<()> {
        let path = scene.append_new(axis, NodeKind::Path, Some(SceneClass::AxisDomain.name()))?;
        scene.set_attribute(path, "d", d)?;
        scene.set_attribute(path, "fill", "none")?;
        scene.set_attribute(path, "stroke", "currentColor")
    }

    /// Tick group with its mark and label; orientation is left to the caller.
    fn axis_tick<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        axis: NodeId,
        transform: String,
        label: &str,
    ) -> ChartResult<(NodeId, NodeId)> {
        let tick = scene.append_new(axis, NodeKind::Group, Some(SceneClass::Tick.name()))?;
        scene.set_attribute(tick, "transform", &transform)?;
        let mark = scene.append_new(tick, NodeKind::Line, None)?;
        scene.set_attribute(mark, "stroke", "currentColor")?;
        let text = scene.append_new(tick, NodeKind::Text, None)?;
        scene.set_attribute(text, "fill", "currentColor")?;
        scene.set_text(text, label)?;
        Ok((mark, text))
    }

    fn drop_layers<S: SceneGraph + ?Sized>(&mut self, scene: &mut S) -> ChartResult<()> {
        for layer in self.layers.drain(..) {
            for node in &layer.nodes {
                scene.cancel_transitions(*node);
            }
            scene.remove_node(layer.group)?;
        }
        Ok(())
    }

    fn draw_candles<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        state: &ChartState,
        candles: &[CandleGeometry],
    ) -> ChartResult<()> {
        let tooltip = self.nodes.tooltip;
        let group = scene.append_new(self.nodes.chart, NodeKind::Group, Some(SceneClass::CandleLayer.name()))?;
        scene.set_attribute(group, "data-generation", &state.generation.to_string())?;
        let mut layer = CandleLayer { group, nodes: Vec::with_capacity(candles.len() * 2) };

        let keys: Vec<String> = candles.iter().map(|c| c.key.clone()).collect();
        let handlers: Vec<Rc<CandleHoverHandler>> = state
            .dataset
            .iter()
            .enumerate()
            .map(|(i, record)| Rc::new(CandleHoverHandler::new(*record, state.dataset.previous_close(i), tooltip)))
            .collect();

        for index in scene.bind_data_by_key(group, SceneClass::CandleBody.name(), &keys)? {
            let candle = &candles[index];
            let enter = EnterAnimation::new(candle);
            let body = scene.append_new(group, NodeKind::Rect, Some(SceneClass::CandleBody.name()))?;
            scene.set_attribute(body, DATA_KEY_ATTR, &candle.key)?;
            scene.set_numeric_attributes(
                body,
                &[
                    ("x", enter.start.body.x),
                    ("y", enter.start.body.y),
                    ("width", enter.start.body.width),
                    ("height", enter.start.body.height),
                ],
            )?;
            scene.set_style(body, "fill", candle.color())?;
            scene.run_transition(body, enter.body_transition())?;
            scene.attach_pointer_handler(body, handlers[index].clone())?;
            layer.nodes.push(body);
        }

        for index in scene.bind_data_by_key(group, SceneClass::CandleWick.name(), &keys)? {
            let candle = &candles[index];
            let enter = EnterAnimation::new(candle);
            let wick = scene.append_new(group, NodeKind::Line, Some(SceneClass::CandleWick.name()))?;
            scene.set_attribute(wick, DATA_KEY_ATTR, &candle.key)?;
            scene.set_numeric_attributes(
                wick,
                &[
                    ("x1", enter.start.wick.x),
                    ("x2", enter.start.wick.x),
                    ("y1", enter.start.wick.y1),
                    ("y2", enter.start.wick.y2),
                ],
            )?;
            scene.set_attribute(wick, "stroke", candle.color())?;
            scene.run_transition(wick, enter.wick_transition())?;
            scene.attach_pointer_handler(wick, handlers[index].clone())?;
            layer.nodes.push(wick);
        }

        self.layers.push(layer);
        Ok(())
    }
}
