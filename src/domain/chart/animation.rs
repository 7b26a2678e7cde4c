//! Enter animation and tooltip fades as pure `progress → values` functions.
//!
//! A [`Transition`] only describes the motion. Scene backends own the clock
//! and apply [`Transition::sample`] on each tick.

use super::geometry::{BodyRect, CandleGeometry, WickLine};
use strum::AsRefStr;

pub const ENTER_DURATION_MS: f64 = 500.0;
pub const TOOLTIP_FADE_MS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr)]
pub enum Easing {
    #[strum(serialize = "linear")]
    Linear,
    #[default]
    #[strum(serialize = "cubic-in-out")]
    CubicInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenTarget {
    Attribute,
    Style,
}

/// One numeric property moving from `from` to `to`
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    pub name: &'static str,
    pub from: f64,
    pub to: f64,
}

impl Tween {
    pub fn attr(name: &'static str, from: f64, to: f64) -> Self {
        Self { target: TweenTarget::Attribute, name, from, to }
    }

    pub fn style(name: &'static str, from: f64, to: f64) -> Self {
        Self { target: TweenTarget::Style, name, from, to }
    }

    pub fn value_at(&self, eased: f64) -> f64 {
        self.from + (self.to - self.from) * eased
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub duration_ms: f64,
    pub easing: Easing,
    pub tweens: Vec<Tween>,
}

impl Transition {
    pub fn new(duration_ms: f64, easing: Easing) -> Self {
        Self { duration_ms, easing, tweens: Vec::new() }
    }

    pub fn with_tween(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    /// Linear progress after `elapsed_ms`, clamped to `[0, 1]`.
    pub fn progress(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, elapsed_ms: f64) -> bool {
        self.progress(elapsed_ms) >= 1.0
    }

    /// Value of every tween after `elapsed_ms`.
    pub fn sample(&self, elapsed_ms: f64) -> Vec<(&Tween, f64)> {
        let eased = self.easing.apply(self.progress(elapsed_ms));
        self.tweens.iter().map(|t| (t, t.value_at(eased))).collect()
    }

    /// Opacity fade for the tooltip overlay.
    pub fn fade(from: f64, to: f64) -> Self {
        Self::new(TOOLTIP_FADE_MS, Easing::Linear).with_tween(Tween::style("opacity", from, to))
    }
}

/// Candle frame at a point of the enter animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleFrame {
    pub body: BodyRect,
    pub wick: WickLine,
}

/// Collapsed-at-open → full geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnterAnimation {
    pub start: CandleFrame,
    pub end: CandleFrame,
    pub easing: Easing,
}

impl EnterAnimation {
    pub fn new(candle: &CandleGeometry) -> Self {
        let start = CandleFrame {
            body: BodyRect { y: candle.open_y, height: 0.0, ..candle.body },
            wick: WickLine { y1: candle.open_y, y2: candle.open_y, ..candle.wick },
        };
        let end = CandleFrame { body: candle.body, wick: candle.wick };
        Self { start, end, easing: Easing::CubicInOut }
    }

    pub fn frame(&self, progress: f64) -> CandleFrame {
        let t = self.easing.apply(progress);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        CandleFrame {
            body: BodyRect {
                x: lerp(self.start.body.x, self.end.body.x),
                y: lerp(self.start.body.y, self.end.body.y),
                width: lerp(self.start.body.width, self.end.body.width),
                height: lerp(self.start.body.height, self.end.body.height),
            },
            wick: WickLine {
                x: lerp(self.start.wick.x, self.end.wick.x),
                y1: lerp(self.start.wick.y1, self.end.wick.y1),
                y2: lerp(self.start.wick.y2, self.end.wick.y2),
            },
        }
    }

    pub fn body_transition(&self) -> Transition {
        Transition::new(ENTER_DURATION_MS, self.easing)
            .with_tween(Tween::attr("y", self.start.body.y, self.end.body.y))
            .with_tween(Tween::attr("height", self.start.body.height, self.end.body.height))
    }

    pub fn wick_transition(&self) -> Transition {
        Transition::new(ENTER_DURATION_MS, self.easing)
            .with_tween(Tween::attr("y1", self.start.wick.y1, self.end.wick.y1))
            .with_tween(Tween::attr("y2", self.start.wick.y2, self.end.wick.y2))
    }
}
