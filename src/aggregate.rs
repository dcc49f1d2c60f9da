//! Daily resampling, inner join and calendar features.
//!
//! Each canonical hourly table is bucketed by the calendar day of its own
//! (naive) timestamps. A day only gets a bucket when at least one hourly row
//! falls in it, so the inner join keeps exactly the days present on both
//! sides.

use crate::constants::FIRST_WEEKEND_DAY;
use crate::models::{BuildReport, DailyFeatureRow, HourlyLoad, HourlyWeather};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Running mean over the non-null readings of a bucket
#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ExtremaAccumulator {
    min: Option<f64>,
    max: Option<f64>,
}

impl ExtremaAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.min = Some(self.min.map_or(value, |min| min.min(value)));
            self.max = Some(self.max.map_or(value, |max| max.max(value)));
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WeatherBucket {
    temp: MeanAccumulator,
    temp_extrema: ExtremaAccumulator,
    precip_sum: f64,
    wind: MeanAccumulator,
    rh: MeanAccumulator,
}

/// Daily weather aggregates for one date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyWeather {
    pub temp_c_mean: Option<f64>,
    pub temp_c_min: Option<f64>,
    pub temp_c_max: Option<f64>,
    /// Null readings contribute nothing; an all-null day sums to 0.0
    pub precip_mm_sum: f64,
    pub wind_ms_mean: Option<f64>,
    pub rh_pct_mean: Option<f64>,
}

/// Calendar features derived from a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    pub month: u32,
    pub year: i32,
    pub is_weekend: u8,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let weekday = date.weekday().num_days_from_monday();
        Self {
            weekday,
            month: date.month(),
            year: date.year(),
            is_weekend: u8::from(weekday >= FIRST_WEEKEND_DAY),
        }
    }
}

/// Mean daily load per calendar day
pub fn resample_load_daily(rows: &[HourlyLoad]) -> BTreeMap<NaiveDate, f64> {
    let mut buckets: BTreeMap<NaiveDate, MeanAccumulator> = BTreeMap::new();
    for row in rows {
        buckets
            .entry(row.time.date())
            .or_default()
            .push(Some(row.load_mw));
    }
    buckets
        .into_iter()
        .filter_map(|(date, acc)| acc.mean().map(|mean| (date, mean)))
        .collect()
}

/// Weather aggregates per calendar day: temperature mean/min/max,
/// precipitation sum, wind and humidity means
pub fn resample_weather_daily(rows: &[HourlyWeather]) -> BTreeMap<NaiveDate, DailyWeather> {
    let mut buckets: BTreeMap<NaiveDate, WeatherBucket> = BTreeMap::new();
    for row in rows {
        let bucket = buckets.entry(row.time.date()).or_default();
        bucket.temp.push(row.temp_c);
        bucket.temp_extrema.push(row.temp_c);
        bucket.precip_sum += row.precip_mm.unwrap_or(0.0);
        bucket.wind.push(row.wind_ms);
        bucket.rh.push(row.rh_pct);
    }
    buckets
        .into_iter()
        .map(|(date, bucket)| {
            (
                date,
                DailyWeather {
                    temp_c_mean: bucket.temp.mean(),
                    temp_c_min: bucket.temp_extrema.min,
                    temp_c_max: bucket.temp_extrema.max,
                    precip_mm_sum: bucket.precip_sum,
                    wind_ms_mean: bucket.wind.mean(),
                    rh_pct_mean: bucket.rh.mean(),
                },
            )
        })
        .collect()
}

/// Inner-join daily load and weather on date and add calendar features
pub fn join_daily(
    load: &BTreeMap<NaiveDate, f64>,
    weather: &BTreeMap<NaiveDate, DailyWeather>,
) -> (Vec<DailyFeatureRow>, BuildReport) {
    let rows: Vec<DailyFeatureRow> = load
        .iter()
        .filter_map(|(date, load_mean)| {
            weather.get(date).map(|w| {
                let calendar = CalendarFeatures::from_date(*date);
                DailyFeatureRow {
                    date: *date,
                    load_mw_daily_mean: Some(*load_mean),
                    temp_c_mean: w.temp_c_mean,
                    temp_c_min: w.temp_c_min,
                    temp_c_max: w.temp_c_max,
                    precip_mm_sum: w.precip_mm_sum,
                    wind_ms_mean: w.wind_ms_mean,
                    rh_pct_mean: w.rh_pct_mean,
                    weekday: calendar.weekday,
                    month: calendar.month,
                    year: calendar.year,
                    is_weekend: calendar.is_weekend,
                }
            })
        })
        .collect();

    let report = BuildReport {
        load_days: load.len(),
        weather_days: weather.len(),
        rows: rows.len(),
        load_only_days: load.len() - rows.len(),
        weather_only_days: weather.len() - rows.len(),
        first_date: rows.first().map(|row| row.date),
        last_date: rows.last().map(|row| row.date),
    };

    debug!(
        "Joined {} load days with {} weather days into {} rows",
        report.load_days, report.weather_days, report.rows
    );

    (rows, report)
}

/// Resample both hourly tables and join them into the daily dataset
pub fn build_daily_dataset(
    load: &[HourlyLoad],
    weather: &[HourlyWeather],
) -> (Vec<DailyFeatureRow>, BuildReport) {
    let load_daily = resample_load_daily(load);
    let weather_daily = resample_weather_daily(weather);
    join_daily(&load_daily, &weather_daily)
}
