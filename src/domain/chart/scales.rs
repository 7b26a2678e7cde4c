//! Coordinate scales: time → x pixels and price → y pixels.
//!
//! Both scales are continuous linear maps with d3-style tick generation so
//! axes and gridlines land on round values.

use super::layout::Layout;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Dataset, ONE_DAY_MS, Timestamp};
use crate::time_utils::{format_time_label, month_index, month_start, utc_datetime};
use chrono::Datelike;

/// Gap left between adjacent candle bodies.
pub const GUTTER_PX: f64 = 1.0;
/// Candles never get narrower than this, however dense the data.
pub const MIN_CANDLE_WIDTH: f64 = 1.0;
/// Lower price bound is this fraction of the lowest low.
pub const PRICE_FLOOR_FACTOR: f64 = 0.5;
pub const DEFAULT_TICK_COUNT: usize = 10;

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const WEEK_MS: i64 = 7 * ONE_DAY_MS;
/// 1970-01-04, the first Sunday after the epoch.
const SUNDAY_OFFSET_MS: i64 = 3 * ONE_DAY_MS;

/// Continuous linear map `domain → range`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Round values inside the domain, roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        nice_ticks(lo, hi, count)
    }

    /// Label for a tick, with as many decimals as the tick step needs.
    pub fn format_tick(&self, value: f64, count: usize) -> String {
        let (lo, hi) = ordered(self.domain);
        let step = tick_step(lo, hi, count).abs();
        let decimals = if step > 0.0 && step.is_finite() {
            (-step.log10().floor()).max(0.0) as usize
        } else {
            0
        };
        format!("{:.*}", decimals, value)
    }
}

/// Time interval between consecutive time ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    Millis(i64),
    Months(i64),
    Years(i64),
}

impl TickInterval {
    /// Nominal length, used only to pick an interval.
    fn approx_ms(&self) -> f64 {
        match self {
            TickInterval::Millis(ms) => *ms as f64,
            TickInterval::Months(n) => *n as f64 * 30.0 * ONE_DAY_MS as f64,
            TickInterval::Years(n) => *n as f64 * 365.0 * ONE_DAY_MS as f64,
        }
    }

    /// strftime pattern for labels at this granularity.
    pub fn label_pattern(&self) -> &'static str {
        match self {
            TickInterval::Millis(ms) if *ms < MINUTE_MS => "%H:%M:%S",
            TickInterval::Millis(ms) if *ms < ONE_DAY_MS => "%H:%M",
            TickInterval::Millis(_) => "%b %d",
            TickInterval::Months(_) => "%b %Y",
            TickInterval::Years(_) => "%Y",
        }
    }
}

const TICK_INTERVALS: [TickInterval; 17] = [
    TickInterval::Millis(SECOND_MS),
    TickInterval::Millis(5 * SECOND_MS),
    TickInterval::Millis(15 * SECOND_MS),
    TickInterval::Millis(30 * SECOND_MS),
    TickInterval::Millis(MINUTE_MS),
    TickInterval::Millis(5 * MINUTE_MS),
    TickInterval::Millis(15 * MINUTE_MS),
    TickInterval::Millis(30 * MINUTE_MS),
    TickInterval::Millis(HOUR_MS),
    TickInterval::Millis(3 * HOUR_MS),
    TickInterval::Millis(6 * HOUR_MS),
    TickInterval::Millis(12 * HOUR_MS),
    TickInterval::Millis(ONE_DAY_MS),
    TickInterval::Millis(2 * ONE_DAY_MS),
    TickInterval::Millis(WEEK_MS),
    TickInterval::Months(1),
    TickInterval::Months(3),
];

/// Continuous time scale `[t0, t1] → range`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: (Timestamp, Timestamp),
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (Timestamp, Timestamp), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (Timestamp, Timestamp) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn scale(&self, ts: Timestamp) -> f64 {
        self.scale_ms(ts.as_f64())
    }

    pub fn scale_ms(&self, ms: f64) -> f64 {
        self.linear().scale(ms)
    }

    /// Pixel back to epoch milliseconds.
    pub fn invert(&self, pixel: f64) -> f64 {
        self.linear().invert(pixel)
    }

    /// Pixel width of one calendar day.
    pub fn day_width(&self) -> f64 {
        let start = self.domain.0.as_f64();
        self.scale_ms(start + ONE_DAY_MS as f64) - self.scale_ms(start)
    }

    /// Interval whose length is closest (by ratio) to `span / count`.
    pub fn tick_interval(&self, count: usize) -> TickInterval {
        let (t0, t1) = self.domain;
        let span = (t1.value() - t0.value()).abs() as f64;
        let target = span / count.max(1) as f64;

        let upper = TICK_INTERVALS.iter().position(|i| i.approx_ms() > target);
        match upper {
            Some(0) => TICK_INTERVALS[0],
            Some(i) => {
                let below = TICK_INTERVALS[i - 1];
                let above = TICK_INTERVALS[i];
                if target / below.approx_ms() < above.approx_ms() / target { below } else { above }
            }
            None => {
                let years = span / TickInterval::Years(1).approx_ms();
                let step = tick_step(0.0, years, count).max(1.0);
                TickInterval::Years(step.round() as i64)
            }
        }
    }

    pub fn ticks(&self, count: usize) -> Vec<Timestamp> {
        let (t0, t1) = self.domain;
        let (start, stop) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        match self.tick_interval(count) {
            TickInterval::Millis(step) => {
                let offset = if step == WEEK_MS { SUNDAY_OFFSET_MS } else { 0 };
                let first = (start.value() - offset).div_euclid(step) * step + offset;
                let first = if first < start.value() { first + step } else { first };
                (0..)
                    .map(|i| first + i * step)
                    .take_while(|t| *t <= stop.value())
                    .map(Timestamp::from_millis)
                    .collect()
            }
            TickInterval::Months(n) => {
                let (Some(from), Some(to)) = (month_index(start), month_index(stop)) else {
                    return Vec::new();
                };
                (from..=to + 1)
                    .filter(|m| m.rem_euclid(n) == 0)
                    .filter_map(month_start)
                    .filter(|t| *t >= start && *t <= stop)
                    .collect()
            }
            TickInterval::Years(n) => {
                let (Some(from), Some(to)) = (utc_datetime(start), utc_datetime(stop)) else {
                    return Vec::new();
                };
                (from.year() as i64..=to.year() as i64)
                    .filter(|y| y.rem_euclid(n) == 0)
                    .filter_map(|y| month_start(y * 12))
                    .filter(|t| *t >= start && *t <= stop)
                    .collect()
            }
        }
    }

    pub fn format_tick(&self, ts: Timestamp, count: usize) -> String {
        format_time_label(ts, self.tick_interval(count).label_pattern())
    }

    fn linear(&self) -> LinearScale {
        LinearScale::new((self.domain.0.as_f64(), self.domain.1.as_f64()), self.range)
    }
}

/// Scales of one load, plus the candle width derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSet {
    pub x: TimeScale,
    pub y: LinearScale,
    pub candle_width: f64,
}

/// Derives the scale pair from a dataset and the layout
#[derive(Debug, Default, Clone, Copy)]
pub struct ScaleEngine;

impl ScaleEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, dataset: &Dataset, layout: &Layout) -> ChartResult<ScaleSet> {
        if dataset.is_empty() {
            return Err(ChartError::data("cannot derive scales from an empty dataset"));
        }

        let (Some(start), Some(end)) = (dataset.first().date.add_days(-1), dataset.last().date.add_days(1))
        else {
            return Err(ChartError::data("padded date domain leaves the timestamp range"));
        };
        let x = TimeScale::new((start, end), (0.0, layout.width));
        let y = LinearScale::new(
            (dataset.min_low() * PRICE_FLOOR_FACTOR, dataset.max_high()),
            (layout.height, 0.0),
        );

        let day_width = x.day_width();
        let candle_width = (day_width - GUTTER_PX).max(MIN_CANDLE_WIDTH);

        let samples = [
            x.scale(x.domain().0),
            x.scale(x.domain().1),
            y.scale(y.domain().0),
            y.scale(y.domain().1),
            day_width,
        ];
        if samples.iter().any(|p| !p.is_finite()) {
            return Err(ChartError::data(format!(
                "scale mapping is not finite (price domain {:?})",
                y.domain()
            )));
        }

        crate::log_debug!(
            LogComponent::Domain("ScaleEngine"),
            "x {:?} -> [0, {}], y {:?} -> [{}, 0], candle width {:.2}",
            x.domain(),
            layout.width,
            y.domain(),
            layout.height,
            candle_width
        );

        Ok(ScaleSet { x, y, candle_width })
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Step between nice ticks: 1, 2 or 5 times a power of ten.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start) / count.max(1) as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 0.0;
    }
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

/// Nice ticks within `[start, stop]`, computed on integers to avoid drift.
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !(start.is_finite() && stop.is_finite()) || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let step = tick_step(start, stop, count);
    if step <= 0.0 {
        return Vec::new();
    }

    if step < 1.0 {
        let inv = (1.0 / step).round();
        let mut i1 = (start * inv).round();
        let mut i2 = (stop * inv).round();
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        let n = (i2 - i1).max(-1.0) as i64 + 1;
        (0..n).map(|k| (i1 + k as f64) / inv).collect()
    } else {
        let mut i1 = (start / step).round();
        let mut i2 = (stop / step).round();
        if i1 * step < start {
            i1 += 1.0;
        }
        if i2 * step > stop {
            i2 -= 1.0;
        }
        let n = (i2 - i1).max(-1.0) as i64 + 1;
        (0..n).map(|k| (i1 + k as f64) * step).collect()
    }
}
