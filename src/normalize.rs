//! Load normalization: raw export rows to the canonical hourly load table.
//!
//! Rows from other regions are filtered out, timestamps are parsed with an
//! ordered chain of patterns and values are coerced to numbers. Rows that
//! fail either step are dropped and counted in a [`NormalizeReport`] rather
//! than raising errors.

use crate::constants::{DIAGNOSTIC_SAMPLE_SIZE, LOAD_TIMESTAMP_DASH, LOAD_TIMESTAMP_SLASH};
use crate::models::{HourlyLoad, NormalizeReport, RawLoadTable, RejectedTimestamp};
use chrono::{Datelike, NaiveDateTime};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Known timestamp layouts of the load exports, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPattern {
    /// `01-01-2019 00:00`
    DayMonthYearDash,
    /// `10/08/2021 00:00`
    DayMonthYearSlash,
}

impl TimestampPattern {
    pub const ORDERED: [TimestampPattern; 2] = [
        TimestampPattern::DayMonthYearDash,
        TimestampPattern::DayMonthYearSlash,
    ];

    pub fn format(self) -> &'static str {
        match self {
            TimestampPattern::DayMonthYearDash => LOAD_TIMESTAMP_DASH,
            TimestampPattern::DayMonthYearSlash => LOAD_TIMESTAMP_SLASH,
        }
    }

    pub fn parse(self, raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw.trim(), self.format()).ok()
    }
}

/// Outcome of running the pattern chain over one timestamp string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    Parsed {
        time: NaiveDateTime,
        pattern: TimestampPattern,
    },
    Unparseable,
}

/// Try each pattern in order; the first match wins
pub fn parse_timestamp(raw: &str) -> ParsedTimestamp {
    TimestampPattern::ORDERED
        .iter()
        .find_map(|&pattern| {
            pattern
                .parse(raw)
                .map(|time| ParsedTimestamp::Parsed { time, pattern })
        })
        .unwrap_or(ParsedTimestamp::Unparseable)
}

/// Coerce a raw value to MW; empty, non-numeric and NaN values are missing
pub fn parse_load_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Build the canonical hourly load table for `country_code`
pub fn normalize_load(
    tables: &[RawLoadTable],
    country_code: &str,
) -> (Vec<HourlyLoad>, NormalizeReport) {
    let target = country_code.to_uppercase();
    let mut report = NormalizeReport {
        files_read: tables.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for record in tables.iter().flat_map(|table| table.records.iter()) {
        report.rows_read += 1;

        if record.country_code.to_uppercase() != target {
            report.rows_other_region += 1;
            continue;
        }

        let time = match parse_timestamp(&record.timestamp_raw) {
            ParsedTimestamp::Parsed { time, pattern } => {
                *report.rows_per_pattern.entry(pattern.format()).or_default() += 1;
                time
            }
            ParsedTimestamp::Unparseable => {
                report.unparseable_timestamps += 1;
                if report.rejected_samples.len() < DIAGNOSTIC_SAMPLE_SIZE {
                    report.rejected_samples.push(RejectedTimestamp {
                        raw: record.timestamp_raw.clone(),
                        source: Arc::clone(&record.source),
                    });
                }
                continue;
            }
        };

        let Some(load_mw) = parse_load_value(&record.value_raw) else {
            report.non_numeric_values += 1;
            continue;
        };

        rows.push(HourlyLoad { time, load_mw });
    }

    // Stable sort keeps file order among equal timestamps
    rows.sort_by_key(|row| row.time);
    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(dedup_key(row)));
    report.duplicates_removed = before - rows.len();
    report.rows_kept = rows.len();

    summarize_coverage(&rows, &mut report);
    debug!(
        "Normalized {} of {} rows for {}",
        report.rows_kept, report.rows_read, target
    );

    (rows, report)
}

/// Exact (time, value) identity; -0.0 and 0.0 are the same reading
fn dedup_key(row: &HourlyLoad) -> (NaiveDateTime, u64) {
    let value = if row.load_mw == 0.0 { 0.0 } else { row.load_mw };
    (row.time, value.to_bits())
}

fn summarize_coverage(rows: &[HourlyLoad], report: &mut NormalizeReport) {
    let mut days = BTreeSet::new();
    for row in rows {
        *report.rows_per_year.entry(row.time.year()).or_default() += 1;
        days.insert(row.time.date());
    }

    report.first_time = rows.first().map(|row| row.time);
    report.last_time = rows.last().map(|row| row.time);

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        let span = (*last - *first).num_days() as usize + 1;
        report.missing_days = span - days.len();
    }
}

/// Emit the row accounting through tracing
pub fn log_normalize_report(report: &NormalizeReport) {
    info!(
        "Load rows: {} read, {} other region, {} kept",
        report.rows_read, report.rows_other_region, report.rows_kept
    );

    if report.unparseable_timestamps > 0 {
        let samples: Vec<String> = report
            .rejected_samples
            .iter()
            .map(|sample| format!("'{}' ({})", sample.raw, sample.source.display()))
            .collect();
        warn!(
            "Dropped {} rows with unparseable timestamps, e.g. {}",
            report.unparseable_timestamps,
            samples.join(", ")
        );
    }
    if report.non_numeric_values > 0 {
        warn!("Dropped {} rows with non-numeric values", report.non_numeric_values);
    }
    if report.duplicates_removed > 0 {
        debug!("Removed {} duplicate rows", report.duplicates_removed);
    }
    if report.missing_days > 0 {
        warn!(
            "{} calendar days without load data inside the covered range",
            report.missing_days
        );
    }
}
