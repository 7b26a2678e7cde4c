use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

/// Value Object - pixel margins around the plotting area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self { top: 30.0, right: 60.0, bottom: 30.0, left: 60.0 }
    }
}

/// What happens to candles drawn by earlier loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedrawPolicy {
    /// Every load appends a fresh candle layer; nothing is removed.
    #[default]
    #[strum(serialize = "accumulate")]
    Accumulate,
    /// Earlier candle layers are removed before the new one is drawn.
    #[strum(serialize = "replace")]
    Replace,
}

/// Construction input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Container selector, e.g. `#chart`
    pub bindto: String,
    #[serde(default)]
    pub margin: Option<Margin>,
    #[serde(default)]
    pub redraw: RedrawPolicy,
}

impl ChartConfig {
    pub fn new(bindto: impl Into<String>) -> Self {
        Self { bindto: bindto.into(), margin: None, redraw: RedrawPolicy::default() }
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_redraw(mut self, redraw: RedrawPolicy) -> Self {
        self.redraw = redraw;
        self
    }

    pub fn margin_or_default(&self) -> Margin {
        self.margin.unwrap_or_default()
    }
}

/// Stable class names external stylesheets hook into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum SceneClass {
    #[strum(serialize = "candlestick-svg")]
    Svg,
    #[strum(serialize = "grid-group")]
    GridGroup,
    #[strum(serialize = "gridline")]
    Gridline,
    #[strum(serialize = "axis-group")]
    AxisGroup,
    #[strum(serialize = "x-axis")]
    XAxis,
    #[strum(serialize = "y-axis")]
    YAxis,
    #[strum(serialize = "domain")]
    AxisDomain,
    #[strum(serialize = "tick")]
    Tick,
    #[strum(serialize = "chart-group")]
    ChartGroup,
    #[strum(serialize = "candle-layer")]
    CandleLayer,
    #[strum(serialize = "candle-body")]
    CandleBody,
    #[strum(serialize = "candle-wick")]
    CandleWick,
    #[strum(serialize = "candlestick-tooltip")]
    Tooltip,
}

impl SceneClass {
    pub fn name(self) -> &'static str {
        self.into()
    }
}
