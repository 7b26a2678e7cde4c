use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

use super::services::DataValidationService;
use super::value_objects::{Direction, Timestamp};
use crate::domain::errors::ChartResult;

/// Domain entity - one OHLC time bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcRecord {
    pub date: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcRecord {
    pub fn new(date: Timestamp, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self { date, open, high, low, close }
    }

    pub fn direction(&self) -> Direction {
        Direction::classify(self.open, self.close)
    }

    /// max(open, close)
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// min(open, close)
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    /// `low <= min(open, close) <= max(open, close) <= high`, all finite.
    pub fn is_consistent(&self) -> bool {
        [self.open, self.high, self.low, self.close].iter().all(|v| v.is_finite())
            && self.low <= self.body_bottom()
            && self.body_top() <= self.high
    }
}

/// Domain entity - validated, non-empty, strictly date-ordered series.
///
/// Only [`Dataset::new`] builds one, so holding a `Dataset` means the
/// ordering and OHLC invariants hold. Clones share the same records.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Arc<Vec<OhlcRecord>>,
}

impl Dataset {
    pub fn new(records: Vec<OhlcRecord>) -> ChartResult<Self> {
        DataValidationService::new().validate(&records)?;
        Ok(Self { records: Arc::new(records) })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed dataset; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[OhlcRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcRecord> {
        self.records.iter()
    }

    pub fn first(&self) -> &OhlcRecord {
        &self.records[0]
    }

    pub fn last(&self) -> &OhlcRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn min_low(&self) -> f64 {
        self.records.iter().map(|r| r.low).fold(f64::INFINITY, f64::min)
    }

    pub fn max_high(&self) -> f64 {
        self.records.iter().map(|r| r.high).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Close of the record before `index`, if any.
    pub fn previous_close(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.records.get(i)).map(|r| r.close)
    }
}

impl Index<usize> for Dataset {
    type Output = OhlcRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a OhlcRecord;
    type IntoIter = std::slice::Iter<'a, OhlcRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ChartError;
    use crate::domain::market_data::ONE_DAY_MS;

    fn record(day: i64, open: f64, high: f64, low: f64, close: f64) -> OhlcRecord {
        OhlcRecord::new(Timestamp::from_millis(day * ONE_DAY_MS), open, high, low, close)
    }

    #[test]
    fn extremes_and_previous_close() {
        let dataset = Dataset::new(vec![
            record(0, 100.0, 112.0, 98.0, 110.0),
            record(1, 110.0, 111.0, 104.0, 105.0),
        ])
        .unwrap();

        assert_eq!(dataset.min_low(), 98.0);
        assert_eq!(dataset.max_high(), 112.0);
        assert_eq!(dataset.previous_close(0), None);
        assert_eq!(dataset.previous_close(1), Some(110.0));
        assert_eq!(dataset[1].direction(), Direction::Down);
    }

    #[test]
    fn empty_dataset_is_a_data_error() {
        assert!(matches!(Dataset::new(Vec::new()), Err(ChartError::DataError(_))));
    }

    #[test]
    fn consistency_rejects_nan() {
        let r = record(0, f64::NAN, 2.0, 1.0, 1.5);
        assert!(!r.is_consistent());
    }
}
