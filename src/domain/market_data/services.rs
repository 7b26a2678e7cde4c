use super::entities::OhlcRecord;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;

/// Domain service checking incoming records before they reach the chart
#[derive(Debug, Default, Clone, Copy)]
pub struct DataValidationService;

impl DataValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Empty input is a `DataError`; the first broken record is a `ValidationError`.
    pub fn validate(&self, records: &[OhlcRecord]) -> ChartResult<()> {
        if records.is_empty() {
            return Err(ChartError::data("dataset is empty"));
        }

        for (index, record) in records.iter().enumerate() {
            self.validate_record(index, record)?;
        }

        for (index, pair) in records.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(ChartError::validation(
                    index + 1,
                    format!(
                        "date {} is not after previous date {}",
                        pair[1].date, pair[0].date
                    ),
                ));
            }
        }

        crate::log_trace!(
            LogComponent::Domain("Validation"),
            "validated {} records",
            records.len()
        );
        Ok(())
    }

    pub fn validate_record(&self, index: usize, record: &OhlcRecord) -> ChartResult<()> {
        let values = [
            ("open", record.open),
            ("high", record.high),
            ("low", record.low),
            ("close", record.close),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ChartError::validation(index, format!("{} is not finite ({})", name, value)));
        }
        if record.low > record.body_bottom() {
            return Err(ChartError::validation(
                index,
                format!("low {} above min(open, close) {}", record.low, record.body_bottom()),
            ));
        }
        if record.body_top() > record.high {
            return Err(ChartError::validation(
                index,
                format!("high {} below max(open, close) {}", record.high, record.body_top()),
            ));
        }
        Ok(())
    }
}
