//! Pipeline tests against small on-disk fixtures
//!
//! Each test builds a throwaway directory holding load exports and a cached
//! weather response, then drives the pipeline stages over it.

pub mod error_handling;

use crate::config::PipelineConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// First day of load data: RO mean 6200, plus a BG row that must be ignored
pub const LOAD_JANUARY_1: &str = "\
CountryCode;DateUTC;Value
RO;01-01-2019 00:00;6000
RO;01-01-2019 01:00;6200
BG;01-01-2019 01:00;4100
RO;01-01-2019 02:00;6400
";

/// Second day in slash format: RO mean 5250, plus a repeat of a 2019-01-01 row
pub const LOAD_JANUARY_2: &str = "\
CountryCode;DateUTC;Value
RO;02/01/2019 00:00;5000
RO;02/01/2019 01:00;5500
RO;01/01/2019 00:00;6000
";

/// Hourly weather for 2019-01-01 through 2019-01-03
pub const WEATHER: &str = r#"{
    "latitude": 44.43,
    "longitude": 26.1,
    "timezone": "GMT",
    "hourly": {
        "time": ["2019-01-01T00:00", "2019-01-01T12:00", "2019-01-02T00:00",
                 "2019-01-02T06:00", "2019-01-03T00:00"],
        "temperature_2m": [1.0, 3.0, -1.0, null, 0.0],
        "precipitation": [0.25, 0.5, 0.0, 0.5, 0.0],
        "windspeed_10m": [2.0, 4.0, 1.0, 3.0, 1.0],
        "relative_humidity_2m": [80.0, 90.0, 70.0, null, 75.0]
    }
}"#;

/// Write a load export into the fixture directory
pub fn write_load_file(dir: &Path, name: &str, content: &str) {
    let raw = dir.join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join(name), content).unwrap();
}

/// Two semicolon load exports plus the weather response
pub fn create_fixture(temp_dir: &TempDir) {
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01a.csv",
        LOAD_JANUARY_1,
    );
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01b.csv",
        LOAD_JANUARY_2,
    );
    fs::write(temp_dir.path().join("weather.json"), WEATHER).unwrap();
}

/// Configuration with every path inside the fixture directory
pub fn fixture_config(temp_dir: &TempDir) -> PipelineConfig {
    let root = temp_dir.path();
    PipelineConfig::default()
        .with_load_glob(
            root.join("raw")
                .join("monthly_hourly_load_values_*.csv")
                .to_string_lossy()
                .to_string(),
        )
        .with_weather_source(root.join("weather.json"))
        .with_hourly_load_path(root.join("processed").join("load_hourly.parquet"))
        .with_hourly_weather_path(root.join("processed").join("weather_hourly.parquet"))
        .with_dataset_prefix(root.join("final").join("dataset_daily"))
        .without_progress()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
