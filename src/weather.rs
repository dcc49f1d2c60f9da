//! Hourly weather normalization.
//!
//! Converts a cached Open-Meteo archive response into the canonical hourly
//! weather table. Retrieving the response is left to external tooling; this
//! module only parses, validates and windows it.

use crate::config::DateWindow;
use crate::constants::{WEATHER_TIMESTAMP, columns};
use crate::error::{PipelineError, Result};
use crate::models::{HourlyWeather, WeatherReport};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Top level of an Open-Meteo archive response
#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    #[serde(alias = "wind_speed_10m")]
    windspeed_10m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
}

/// Read and normalize an Open-Meteo archive response from disk
pub fn load_open_meteo(
    path: &Path,
    window: Option<&DateWindow>,
) -> Result<(Vec<HourlyWeather>, WeatherReport)> {
    if !path.exists() {
        return Err(PipelineError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    parse_open_meteo(&text, path, window)
}

/// Parse an Open-Meteo archive response; `path` is used in error messages
pub fn parse_open_meteo(
    json: &str,
    path: &Path,
    window: Option<&DateWindow>,
) -> Result<(Vec<HourlyWeather>, WeatherReport)> {
    let response: ArchiveResponse = serde_json::from_str(json)?;
    if let (Some(lat), Some(lon)) = (response.latitude, response.longitude) {
        debug!(
            "Weather source {} at {:.4},{:.4} ({})",
            path.display(),
            lat,
            lon,
            response.timezone.as_deref().unwrap_or("unknown timezone")
        );
    }

    let hourly = response.hourly;
    let expected = hourly.time.len();
    for (name, len) in [
        ("temperature_2m", hourly.temperature_2m.len()),
        ("precipitation", hourly.precipitation.len()),
        ("windspeed_10m", hourly.windspeed_10m.len()),
        ("relative_humidity_2m", hourly.relative_humidity_2m.len()),
    ] {
        if len != expected {
            return Err(PipelineError::InvalidWeather {
                path: path.to_path_buf(),
                reason: format!("{} has {} values but time has {}", name, len, expected),
            });
        }
    }

    let mut rows = Vec::with_capacity(expected);
    for (i, stamp) in hourly.time.iter().enumerate() {
        let time = parse_weather_time(stamp).ok_or_else(|| PipelineError::InvalidWeather {
            path: path.to_path_buf(),
            reason: format!("unparseable time '{}' at index {}", stamp, i),
        })?;
        rows.push(HourlyWeather {
            time,
            temp_c: hourly.temperature_2m[i],
            precip_mm: hourly.precipitation[i],
            wind_ms: hourly.windspeed_10m[i],
            rh_pct: hourly.relative_humidity_2m[i],
        });
    }

    let rows_read = rows.len();
    if let Some(window) = window {
        rows.retain(|row| window.contains(row.time.date()));
    }

    ensure_canonical(&mut rows, path)?;

    let report = WeatherReport {
        rows_read,
        rows_outside_window: rows_read - rows.len(),
        rows_kept: rows.len(),
        null_readings: count_nulls(&rows),
        first_time: rows.first().map(|row| row.time),
        last_time: rows.last().map(|row| row.time),
    };
    Ok((rows, report))
}

fn parse_weather_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, WEATHER_TIMESTAMP)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Sort by time and reject duplicate timestamps
pub fn ensure_canonical(rows: &mut [HourlyWeather], path: &Path) -> Result<()> {
    if !rows.is_sorted_by_key(|row| row.time) {
        debug!("Sorting unordered weather rows from {}", path.display());
        rows.sort_by_key(|row| row.time);
    }
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].time == pair[1].time) {
        return Err(PipelineError::InvalidWeather {
            path: path.to_path_buf(),
            reason: format!("duplicate timestamp {}", pair[0].time),
        });
    }
    Ok(())
}

fn count_nulls(rows: &[HourlyWeather]) -> std::collections::BTreeMap<&'static str, usize> {
    let mut counts = std::collections::BTreeMap::new();
    for row in rows {
        for (name, value) in [
            (columns::TEMP_C, row.temp_c),
            (columns::PRECIP_MM, row.precip_mm),
            (columns::WIND_MS, row.wind_ms),
            (columns::RH_PCT, row.rh_pct),
        ] {
            let entry = counts.entry(name).or_insert(0);
            if value.is_none() {
                *entry += 1;
            }
        }
    }
    counts
}

/// Emit the weather summary through tracing
pub fn log_weather_report(report: &WeatherReport) {
    info!(
        "Weather rows: {} read, {} outside window, {} kept",
        report.rows_read, report.rows_outside_window, report.rows_kept
    );
    for (column, nulls) in report.null_readings.iter().filter(|(_, n)| **n > 0) {
        debug!("{} null readings in {}", nulls, column);
    }
}
