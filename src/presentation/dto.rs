use serde::Deserialize;

use crate::domain::{
    errors::{ChartError, ChartResult},
    market_data::{OhlcRecord, Timestamp},
};
use crate::time_utils::parse_date;

/// Furthest instant from the epoch a JS `Date` can hold, in milliseconds.
pub const MAX_DATE_MS: f64 = 8.64e15;

/// `date` as it arrives from JS: epoch milliseconds (a `Date` is read through
/// `getTime()` before deserialization) or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(f64),
    Text(String),
}

impl DateInput {
    /// `None` for NaN, unreadable text and anything outside the JS `Date` range.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        let ts = match self {
            DateInput::Millis(ms) if ms.is_finite() => Timestamp::from_millis(ms.round() as i64),
            DateInput::Millis(_) => return None,
            DateInput::Text(text) => parse_date(text)?,
        };
        Some(ts).filter(|ts| ts.as_f64().abs() <= MAX_DATE_MS)
    }
}

/// One record of the `loadData` array. Prices are taken as-is, non-finite
/// ones are rejected by dataset validation with the record's index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OhlcRecordDto {
    pub date: DateInput,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcRecordDto {
    pub fn into_record(self, index: usize) -> ChartResult<OhlcRecord> {
        let date = self
            .date
            .to_timestamp()
            .ok_or_else(|| ChartError::validation(index, format!("unreadable or out of range date {:?}", self.date)))?;
        Ok(OhlcRecord::new(date, self.open, self.high, self.low, self.close))
    }
}

pub fn records_from_dtos(dtos: Vec<OhlcRecordDto>) -> ChartResult<Vec<OhlcRecord>> {
    dtos.into_iter().enumerate().map(|(i, dto)| dto.into_record(i)).collect()
}
