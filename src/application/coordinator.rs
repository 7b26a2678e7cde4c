use crate::application::use_cases::{SceneNodes, SceneRenderer};
use crate::domain::{
    chart::{ChartConfig, GeometryBuilder, Layout, SceneGraph, ScaleEngine},
    errors::ChartResult,
    logging::{LogComponent, get_logger},
    market_data::{Dataset, OhlcRecord},
    state::ChartState,
};

/// Candlestick chart bound to one container of a scene backend.
///
/// Owns the layout, the current [`ChartState`] and the persistent scene
/// nodes. `load_data` takes `&mut self`, so loads never overlap.
pub struct CandlestickChart<S: SceneGraph> {
    scene: S,
    config: ChartConfig,
    layout: Layout,
    renderer: SceneRenderer,
    scales: ScaleEngine,
    geometry: GeometryBuilder,
    state: Option<ChartState>,
}

impl<S: SceneGraph> CandlestickChart<S> {
    /// Resolve the container, compute the layout and create the persistent
    /// nodes. Nothing is created when the container cannot be used.
    pub fn construct(mut scene: S, config: ChartConfig) -> ChartResult<Self> {
        let (layout, container) = Layout::initialize(&config, &scene).inspect_err(|e| {
            get_logger().error(LogComponent::Application("CandlestickChart"), &e.to_string());
        })?;
        let nodes = SceneNodes::mount(&mut scene, container, &layout)?;

        crate::log_info!(
            LogComponent::Application("CandlestickChart"),
            "bound to '{}': plot {}x{}, redraw {}",
            config.bindto,
            layout.width,
            layout.height,
            config.redraw.as_ref()
        );

        Ok(Self {
            renderer: SceneRenderer::new(nodes, layout, config.redraw),
            scene,
            config,
            layout,
            scales: ScaleEngine::new(),
            geometry: GeometryBuilder::new(),
            state: None,
        })
    }

    /// Validate, compute scales and geometry, then draw. The scene and the
    /// previous state are untouched unless every computation succeeds.
    pub fn load_data(&mut self, records: Vec<OhlcRecord>) -> ChartResult<()> {
        self.try_load(records).inspect_err(|e| {
            get_logger().error(LogComponent::Application("CandlestickChart"), &e.to_string());
        })
    }

    fn try_load(&mut self, records: Vec<OhlcRecord>) -> ChartResult<()> {
        let dataset = Dataset::new(records)?;
        let scales = self.scales.compute(&dataset, &self.layout)?;
        let candles = self.geometry.build(&dataset, &scales)?;
        let state = ChartState::succeed(self.state.as_ref(), dataset, scales);

        self.renderer.render(&mut self.scene, &state, &candles)?;

        crate::log_info!(
            LogComponent::Application("CandlestickChart"),
            "load #{}: {} records",
            state.generation,
            state.dataset.len()
        );
        self.state = Some(state);
        Ok(())
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn nodes(&self) -> &SceneNodes {
        self.renderer.nodes()
    }

    /// State of the last successful load.
    pub fn state(&self) -> Option<&ChartState> {
        self.state.as_ref()
    }

    /// Candle layers currently in the scene.
    pub fn layer_count(&self) -> usize {
        self.renderer.layer_count()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Backend access for driving time and pointer input.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
}
