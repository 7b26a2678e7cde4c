use super::scales::ScaleSet;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Dataset, Direction, OhlcRecord};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Datasets at least this long are built on the rayon pool.
#[cfg(feature = "parallel")]
pub const PARALLEL_THRESHOLD: usize = 100;

/// Candle body in plot coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Vertical high-low line through the candle center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WickLine {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
}

/// Everything needed to draw one record
#[derive(Debug, Clone, PartialEq)]
pub struct CandleGeometry {
    /// Binding key: the record date in epoch milliseconds.
    pub key: String,
    pub direction: Direction,
    pub body: BodyRect,
    pub wick: WickLine,
    /// Pixel row of the open price, where the enter animation starts.
    pub open_y: f64,
}

impl CandleGeometry {
    pub fn color(&self) -> &'static str {
        self.direction.color()
    }

    fn is_finite(&self) -> bool {
        [
            self.body.x,
            self.body.y,
            self.body.width,
            self.body.height,
            self.wick.x,
            self.wick.y1,
            self.wick.y2,
            self.open_y,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GeometryBuilder;

impl GeometryBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn candle(&self, record: &OhlcRecord, scales: &ScaleSet) -> CandleGeometry {
        let center = scales.x.scale(record.date);
        let top = scales.y.scale(record.body_top());
        let bottom = scales.y.scale(record.body_bottom());

        CandleGeometry {
            key: record.date.value().to_string(),
            direction: record.direction(),
            body: BodyRect {
                x: center - scales.candle_width / 2.0,
                y: top,
                width: scales.candle_width,
                height: bottom - top + 1.0,
            },
            wick: WickLine {
                x: center,
                y1: scales.y.scale(record.low),
                y2: scales.y.scale(record.high),
            },
            open_y: scales.y.scale(record.open),
        }
    }

    /// One geometry per record, in dataset order. Fails as a whole on any
    /// non-finite coordinate.
    pub fn build(&self, dataset: &Dataset, scales: &ScaleSet) -> ChartResult<Vec<CandleGeometry>> {
        let candles = self.build_all(dataset, scales);

        if let Some(index) = candles.iter().position(|c| !c.is_finite()) {
            return Err(ChartError::data(format!(
                "record {} maps to a non-finite coordinate",
                index
            )));
        }

        crate::log_trace!(
            LogComponent::Domain("GeometryBuilder"),
            "built {} candles, width {:.2}",
            candles.len(),
            scales.candle_width
        );
        Ok(candles)
    }

    #[cfg(feature = "parallel")]
    fn build_all(&self, dataset: &Dataset, scales: &ScaleSet) -> Vec<CandleGeometry> {
        if dataset.len() >= PARALLEL_THRESHOLD {
            dataset.records().par_iter().map(|r| self.candle(r, scales)).collect()
        } else {
            dataset.iter().map(|r| self.candle(r, scales)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn build_all(&self, dataset: &Dataset, scales: &ScaleSet) -> Vec<CandleGeometry> {
        dataset.iter().map(|r| self.candle(r, scales)).collect()
    }
}
