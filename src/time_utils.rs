use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::domain::market_data::Timestamp;

/// UTC calendar view of a timestamp. `None` outside chrono's range.
pub fn utc_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ts.value())
}

/// Format a timestamp with a strftime pattern in UTC.
pub fn format_time_label(ts: Timestamp, pattern: &str) -> String {
    match utc_datetime(ts) {
        Some(dt) => dt.format(pattern).to_string(),
        None => ts.value().to_string(),
    }
}

/// Date shown in the tooltip; the time part only when it is not midnight.
pub fn format_tooltip_date(ts: Timestamp) -> String {
    match utc_datetime(ts) {
        Some(dt) if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 => {
            dt.format("%Y-%m-%d").to_string()
        }
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.value().to_string(),
    }
}

/// Months since year 0, counting January of year 0 as 0.
pub fn month_index(ts: Timestamp) -> Option<i64> {
    utc_datetime(ts).map(|dt| dt.year() as i64 * 12 + dt.month0() as i64)
}

/// Midnight UTC on the first day of the given month index.
pub fn month_start(index: i64) -> Option<Timestamp> {
    let year = index.div_euclid(12) as i32;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Timestamp::from_millis(dt.and_utc().timestamp_millis()))
}

/// Accepts RFC 3339 (what `JSON.stringify(new Date())` yields), a naive
/// `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Timestamp::from_millis(dt.timestamp_millis()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Timestamp::from_millis(dt.and_utc().timestamp_millis()));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Timestamp::from_millis(dt.and_utc().timestamp_millis()))
}
