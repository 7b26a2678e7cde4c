use super::scene::{BoundingBox, NodeId, SceneGraph};
use super::value_objects::{ChartConfig, Margin};
use crate::domain::errors::{ChartError, ChartResult};

/// Plotting area inside the container. Fixed for the chart's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub margin: Margin,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    /// Resolve `config.bindto`, measure it and subtract the margins.
    pub fn initialize<S: SceneGraph + ?Sized>(config: &ChartConfig, scene: &S) -> ChartResult<(Self, NodeId)> {
        let container = scene.select(&config.bindto).ok_or_else(|| {
            ChartError::configuration(format!("no container matches '{}'", config.bindto))
        })?;
        let bounds = scene.measure(container)?;
        let layout = Self::from_bounds(config.margin_or_default(), bounds)?;
        Ok((layout, container))
    }

    pub fn from_bounds(margin: Margin, bounds: BoundingBox) -> ChartResult<Self> {
        let width = bounds.width - margin.horizontal();
        let height = bounds.height - margin.vertical();
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ChartError::configuration(format!(
                "container {}x{} leaves no plotting area inside margins {:?}",
                bounds.width, bounds.height, margin
            )));
        }
        Ok(Self { margin, width, height })
    }

    /// Width of the svg root, margins included.
    pub fn outer_width(&self) -> f64 {
        self.width + self.margin.horizontal()
    }

    pub fn outer_height(&self) -> f64 {
        self.height + self.margin.vertical()
    }
}
