use derive_more::{Constructor, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Milliseconds in one calendar day.
pub const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Value Object - UTC instant in milliseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Constructor, Display, Serialize, Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn from_millis(value: i64) -> Self {
        Self(value)
    }

    /// `None` when the result leaves the `i64` millisecond range.
    pub fn add_days(&self, days: i64) -> Option<Self> {
        days.checked_mul(ONE_DAY_MS).and_then(|ms| self.0.checked_add(ms)).map(Self)
    }
}

/// Value Object - two-state candle classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[strum(serialize = "up")]
    Up,
    #[strum(serialize = "down")]
    Down,
}

impl Direction {
    /// `open > close` is down, everything else (including flat) is up.
    pub fn classify(open: f64, close: f64) -> Self {
        if open > close { Direction::Down } else { Direction::Up }
    }

    /// Fixed color pair: down is blue, up is red.
    pub fn color(&self) -> &'static str {
        match self {
            Direction::Down => "blue",
            Direction::Up => "red",
        }
    }
}
