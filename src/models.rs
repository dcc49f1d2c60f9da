//! Core data structures for the load/weather pipeline.
//!
//! Defines the raw load records produced by the sniffing reader, the
//! canonical hourly rows, the daily feature rows and the diagnostic reports
//! returned by each stage.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One row of a raw load export before any normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawLoadRecord {
    pub country_code: String,
    pub timestamp_raw: String,
    pub value_raw: String,
    /// File the row was read from
    pub source: Arc<PathBuf>,
}

/// A raw load export whose delimiter has been detected and whose required
/// columns have been located
#[derive(Debug, Clone)]
pub struct RawLoadTable {
    pub source: Arc<PathBuf>,
    pub delimiter: u8,
    pub columns: Vec<String>,
    pub records: Vec<RawLoadRecord>,
}

impl RawLoadTable {
    pub fn path(&self) -> &Path {
        self.source.as_path()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Canonical hourly load observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyLoad {
    pub time: NaiveDateTime,
    pub load_mw: f64,
}

/// Canonical hourly weather observation; readings are nullable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyWeather {
    pub time: NaiveDateTime,
    pub temp_c: Option<f64>,
    pub precip_mm: Option<f64>,
    pub wind_ms: Option<f64>,
    pub rh_pct: Option<f64>,
}

/// One row of the final daily dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFeatureRow {
    pub date: NaiveDate,
    /// Always set by the builder; null only in a dataset read back from disk
    pub load_mw_daily_mean: Option<f64>,
    pub temp_c_mean: Option<f64>,
    pub temp_c_min: Option<f64>,
    pub temp_c_max: Option<f64>,
    pub precip_mm_sum: f64,
    pub wind_ms_mean: Option<f64>,
    pub rh_pct_mean: Option<f64>,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    pub month: u32,
    pub year: i32,
    /// 1 on Saturday and Sunday
    pub is_weekend: u8,
}

/// Timestamp string that matched none of the known patterns
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTimestamp {
    pub raw: String,
    pub source: Arc<PathBuf>,
}

/// Row accounting for the load normalization step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub files_read: usize,
    pub rows_read: usize,
    pub rows_other_region: usize,
    pub unparseable_timestamps: usize,
    pub non_numeric_values: usize,
    pub duplicates_removed: usize,
    pub rows_kept: usize,
    /// Rows parsed by each timestamp pattern, keyed by format string
    pub rows_per_pattern: BTreeMap<&'static str, usize>,
    /// Hourly rows per calendar year
    pub rows_per_year: BTreeMap<i32, usize>,
    /// First few unparseable timestamps, for diagnosis
    pub rejected_samples: Vec<RejectedTimestamp>,
    /// Calendar days inside [first, last] without any hourly row
    pub missing_days: usize,
    pub first_time: Option<NaiveDateTime>,
    pub last_time: Option<NaiveDateTime>,
}

impl NormalizeReport {
    /// Rows dropped for any reason other than belonging to another region
    pub fn rows_dropped(&self) -> usize {
        self.unparseable_timestamps + self.non_numeric_values + self.duplicates_removed
    }
}

/// Summary of the weather normalization step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReport {
    pub rows_read: usize,
    pub rows_outside_window: usize,
    pub rows_kept: usize,
    /// Null readings per measurement column
    pub null_readings: BTreeMap<&'static str, usize>,
    pub first_time: Option<NaiveDateTime>,
    pub last_time: Option<NaiveDateTime>,
}

/// Summary of a daily build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub load_days: usize,
    pub weather_days: usize,
    pub rows: usize,
    pub load_only_days: usize,
    pub weather_only_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Paths of the artifacts written by the dataset writer
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetArtifacts {
    pub parquet: PathBuf,
    pub csv: PathBuf,
    pub rows: usize,
}

/// Outcome of a complete `run`
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub load: NormalizeReport,
    pub weather: WeatherReport,
    pub build: BuildReport,
    pub artifacts: DatasetArtifacts,
    pub processing_time_ms: u128,
}
