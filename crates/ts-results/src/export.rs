//! CSV export of a titration curve.

use crate::ResultsResult;
use chrono::{DateTime, SecondsFormat};
use std::path::Path;
use ts_sim::TitrationPoint;

pub const CSV_HEADER: &str = "Volume Added (mL),pH,Timestamp";

/// ISO-8601 (UTC, millisecond precision) for a millisecond epoch timestamp.
///
/// Timestamps outside chrono's range fall back to the raw number.
pub fn format_timestamp(timestamp_ms: f64) -> String {
    if !timestamp_ms.is_finite() {
        return timestamp_ms.to_string();
    }
    match DateTime::from_timestamp_millis(timestamp_ms.round() as i64) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => timestamp_ms.to_string(),
    }
}

/// Curve as CSV: volume in mL (3 dp), pH (3 dp), ISO-8601 timestamp.
pub fn export_csv(points: &[TitrationPoint]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for p in points {
        csv.push_str(&format!(
            "{:.3},{:.3},{}\n",
            p.volume_added * 1000.0,
            p.ph,
            format_timestamp(p.timestamp)
        ));
    }
    csv
}

pub fn write_csv(path: &Path, points: &[TitrationPoint]) -> ResultsResult<()> {
    std::fs::write(path, export_csv(points))?;
    Ok(())
}
