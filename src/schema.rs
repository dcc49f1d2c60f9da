//! Polars schemas for the persisted tables.
//!
//! Converts between the typed rows used by the pipeline and the Polars
//! frames written to (and read back from) Parquet. Timestamps are stored as
//! naive `Datetime[ms]`, dates as `Date`, calendar features as `Int32`.

use crate::constants::columns;
use crate::error::{PipelineError, Result};
use crate::models::{DailyFeatureRow, HourlyLoad, HourlyWeather};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;

/// `num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Frame with `time` and `load_mw`
pub fn hourly_load_frame(rows: &[HourlyLoad]) -> Result<DataFrame> {
    let time = datetime_column(columns::TIME, rows.iter().map(|r| r.time))?;
    let load = Column::new(
        columns::LOAD_MW.into(),
        rows.iter().map(|r| r.load_mw).collect::<Vec<f64>>(),
    );
    Ok(DataFrame::new(vec![time, load])?)
}

/// Frame with `time` and the four nullable measurement columns
pub fn hourly_weather_frame(rows: &[HourlyWeather]) -> Result<DataFrame> {
    let time = datetime_column(columns::TIME, rows.iter().map(|r| r.time))?;
    let measurement = |name: &str, pick: fn(&HourlyWeather) -> Option<f64>| {
        Column::new(name.into(), rows.iter().map(pick).collect::<Vec<Option<f64>>>())
    };
    Ok(DataFrame::new(vec![
        time,
        measurement(columns::TEMP_C, |r| r.temp_c),
        measurement(columns::PRECIP_MM, |r| r.precip_mm),
        measurement(columns::WIND_MS, |r| r.wind_ms),
        measurement(columns::RH_PCT, |r| r.rh_pct),
    ])?)
}

/// Frame with the daily dataset columns in their published order
pub fn daily_frame(rows: &[DailyFeatureRow]) -> Result<DataFrame> {
    let days: Vec<i32> = rows
        .iter()
        .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let date = Column::new(columns::DATE.into(), days).cast(&DataType::Date)?;

    let float = |name: &str, values: Vec<Option<f64>>| Column::new(name.into(), values);
    let int = |name: &str, values: Vec<i32>| Column::new(name.into(), values);

    Ok(DataFrame::new(vec![
        date,
        float(columns::LOAD_MW_DAILY_MEAN, rows.iter().map(|r| r.load_mw_daily_mean).collect()),
        float(columns::TEMP_C_MEAN, rows.iter().map(|r| r.temp_c_mean).collect()),
        float(columns::TEMP_C_MIN, rows.iter().map(|r| r.temp_c_min).collect()),
        float(columns::TEMP_C_MAX, rows.iter().map(|r| r.temp_c_max).collect()),
        Column::new(
            columns::PRECIP_MM_SUM.into(),
            rows.iter().map(|r| r.precip_mm_sum).collect::<Vec<f64>>(),
        ),
        float(columns::WIND_MS_MEAN, rows.iter().map(|r| r.wind_ms_mean).collect()),
        float(columns::RH_PCT_MEAN, rows.iter().map(|r| r.rh_pct_mean).collect()),
        int(columns::WEEKDAY, rows.iter().map(|r| r.weekday as i32).collect()),
        int(columns::MONTH, rows.iter().map(|r| r.month as i32).collect()),
        int(columns::YEAR, rows.iter().map(|r| r.year).collect()),
        int(columns::IS_WEEKEND, rows.iter().map(|r| r.is_weekend as i32).collect()),
    ])?)
}

/// Read canonical hourly load rows from a frame
pub fn hourly_load_from_frame(df: &DataFrame, path: &Path) -> Result<Vec<HourlyLoad>> {
    let times = required_datetimes(df, columns::TIME, path)?;
    let loads = f64_values(df, columns::LOAD_MW, path)?;

    // Null cells cannot come from the normalizer; skip them in foreign files
    Ok(times
        .into_iter()
        .zip(loads)
        .filter_map(|(time, load_mw)| Some(HourlyLoad { time: time?, load_mw: load_mw? }))
        .collect())
}

/// Read canonical hourly weather rows from a frame
pub fn hourly_weather_from_frame(df: &DataFrame, path: &Path) -> Result<Vec<HourlyWeather>> {
    let times = required_datetimes(df, columns::TIME, path)?;
    let temp = f64_values(df, columns::TEMP_C, path)?;
    let precip = f64_values(df, columns::PRECIP_MM, path)?;
    let wind = f64_values(df, columns::WIND_MS, path)?;
    let rh = f64_values(df, columns::RH_PCT, path)?;

    times
        .into_iter()
        .enumerate()
        .map(|(i, time)| {
            let time = time.ok_or_else(|| PipelineError::InvalidWeather {
                path: path.to_path_buf(),
                reason: format!("null time at row {}", i),
            })?;
            Ok(HourlyWeather {
                time,
                temp_c: temp[i],
                precip_mm: precip[i],
                wind_ms: wind[i],
                rh_pct: rh[i],
            })
        })
        .collect()
}

/// Read daily dataset rows from a frame
///
/// A null target is kept so the coverage report can count it; a null date,
/// precipitation sum or calendar cell is a [`PipelineError::NullValue`].
pub fn daily_from_frame(df: &DataFrame, path: &Path) -> Result<Vec<DailyFeatureRow>> {
    let dates = date_values(df, columns::DATE, path)?;
    let load = f64_values(df, columns::LOAD_MW_DAILY_MEAN, path)?;
    let temp_mean = f64_values(df, columns::TEMP_C_MEAN, path)?;
    let temp_min = f64_values(df, columns::TEMP_C_MIN, path)?;
    let temp_max = f64_values(df, columns::TEMP_C_MAX, path)?;
    let precip = f64_values(df, columns::PRECIP_MM_SUM, path)?;
    let wind = f64_values(df, columns::WIND_MS_MEAN, path)?;
    let rh = f64_values(df, columns::RH_PCT_MEAN, path)?;
    let weekday = i32_values(df, columns::WEEKDAY, path)?;
    let month = i32_values(df, columns::MONTH, path)?;
    let year = i32_values(df, columns::YEAR, path)?;
    let is_weekend = i32_values(df, columns::IS_WEEKEND, path)?;

    let int = |values: &[Option<i32>], name: &str, row: usize| {
        values[row].ok_or_else(|| null_value(path, name, row))
    };

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        rows.push(DailyFeatureRow {
            date: dates[i].ok_or_else(|| null_value(path, columns::DATE, i))?,
            load_mw_daily_mean: load[i],
            temp_c_mean: temp_mean[i],
            temp_c_min: temp_min[i],
            temp_c_max: temp_max[i],
            precip_mm_sum: precip[i].ok_or_else(|| null_value(path, columns::PRECIP_MM_SUM, i))?,
            wind_ms_mean: wind[i],
            rh_pct_mean: rh[i],
            weekday: int(&weekday, columns::WEEKDAY, i)? as u32,
            month: int(&month, columns::MONTH, i)? as u32,
            year: int(&year, columns::YEAR, i)?,
            is_weekend: int(&is_weekend, columns::IS_WEEKEND, i)? as u8,
        });
    }
    Ok(rows)
}

fn datetime_column(
    name: &str,
    times: impl Iterator<Item = NaiveDateTime>,
) -> Result<Column> {
    let millis: Vec<i64> = times.map(|t| t.and_utc().timestamp_millis()).collect();
    Ok(Column::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

fn column<'a>(df: &'a DataFrame, name: &str, path: &Path) -> Result<&'a Column> {
    df.column(name).map_err(|_| PipelineError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

fn mismatch(path: &Path, name: &str, expected: &str, found: &DataType) -> PipelineError {
    PipelineError::SchemaMismatch {
        path: path.to_path_buf(),
        column: name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn null_value(path: &Path, name: &str, row: usize) -> PipelineError {
    PipelineError::NullValue {
        path: path.to_path_buf(),
        column: name.to_string(),
        row,
    }
}

fn required_datetimes(
    df: &DataFrame,
    name: &str,
    path: &Path,
) -> Result<Vec<Option<NaiveDateTime>>> {
    let column = column(df, name, path)?;
    if !matches!(column.dtype(), DataType::Datetime(_, _)) {
        return Err(mismatch(path, name, "datetime", column.dtype()));
    }
    let millis = column
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(millis
        .as_materialized_series()
        .i64()?
        .into_iter()
        .map(|ms| ms.and_then(DateTime::from_timestamp_millis).map(|t| t.naive_utc()))
        .collect())
}

fn date_values(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<NaiveDate>>> {
    let column = column(df, name, path)?;
    let days = match column.dtype() {
        DataType::Date => column.cast(&DataType::Int32)?,
        DataType::Datetime(_, _) => column.cast(&DataType::Date)?.cast(&DataType::Int32)?,
        other => return Err(mismatch(path, name, "date", other)),
    };
    Ok(days
        .as_materialized_series()
        .i32()?
        .into_iter()
        .map(|d| d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)))
        .collect())
}

fn f64_values(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<f64>>> {
    let column = column(df, name, path)?;
    if !is_numeric(column.dtype()) {
        return Err(mismatch(path, name, "numeric", column.dtype()));
    }
    let values = column.cast(&DataType::Float64)?;
    Ok(values.as_materialized_series().f64()?.into_iter().collect())
}

fn i32_values(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<i32>>> {
    let column = column(df, name, path)?;
    if !is_numeric(column.dtype()) {
        return Err(mismatch(path, name, "integer", column.dtype()));
    }
    let values = column.cast(&DataType::Int32)?;
    Ok(values.as_materialized_series().i32()?.into_iter().collect())
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32
            | DataType::Boolean
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_load_frame_schema() {
        let rows = vec![
            HourlyLoad { time: at(1, 0), load_mw: 6000.0 },
            HourlyLoad { time: at(1, 1), load_mw: 5900.0 },
        ];
        let df = hourly_load_frame(&rows).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column(columns::TIME).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(hourly_load_from_frame(&df, Path::new("x")).unwrap(), rows);
    }

    #[test]
    fn test_weather_frame_keeps_nulls() {
        let rows = vec![HourlyWeather {
            time: at(1, 0),
            temp_c: None,
            precip_mm: Some(0.2),
            wind_ms: Some(3.0),
            rh_pct: None,
        }];
        let df = hourly_weather_frame(&rows).unwrap();
        assert_eq!(df.column(columns::TEMP_C).unwrap().null_count(), 1);
        assert_eq!(hourly_weather_from_frame(&df, Path::new("x")).unwrap(), rows);
    }

    #[test]
    fn test_daily_frame_column_order() {
        let df = daily_frame(&[]).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, columns::DAILY_DATASET);
        assert_eq!(df.column(columns::DATE).unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_missing_weather_column() {
        let df = hourly_load_frame(&[HourlyLoad { time: at(1, 0), load_mw: 1.0 }]).unwrap();
        match hourly_weather_from_frame(&df, Path::new("weather.parquet")) {
            Err(PipelineError::MissingColumn { column, .. }) => assert_eq!(column, columns::TEMP_C),
            other => panic!("Expected MissingColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_string_time_is_schema_mismatch() {
        let df = DataFrame::new(vec![
            Column::new(columns::TIME.into(), vec!["2019-01-01T00:00"]),
            Column::new(columns::LOAD_MW.into(), vec![1.0]),
        ])
        .unwrap();
        assert!(matches!(
            hourly_load_from_frame(&df, Path::new("load.parquet")),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    fn daily_columns(
        load: Vec<Option<f64>>,
        precip: Vec<Option<f64>>,
        year: Vec<Option<i32>>,
    ) -> DataFrame {
        let n = load.len();
        let days: Vec<i32> = (0..n as i32).map(|d| 17_897 + d).collect();
        let float = |name: &str, values: Vec<Option<f64>>| Column::new(name.into(), values);
        let int = |name: &str, values: Vec<Option<i32>>| Column::new(name.into(), values);
        DataFrame::new(vec![
            Column::new(columns::DATE.into(), days).cast(&DataType::Date).unwrap(),
            float(columns::LOAD_MW_DAILY_MEAN, load),
            float(columns::TEMP_C_MEAN, vec![Some(1.0); n]),
            float(columns::TEMP_C_MIN, vec![Some(0.0); n]),
            float(columns::TEMP_C_MAX, vec![Some(2.0); n]),
            float(columns::PRECIP_MM_SUM, precip),
            float(columns::WIND_MS_MEAN, vec![None; n]),
            float(columns::RH_PCT_MEAN, vec![Some(80.0); n]),
            int(columns::WEEKDAY, vec![Some(1); n]),
            int(columns::MONTH, vec![Some(1); n]),
            int(columns::YEAR, year),
            int(columns::IS_WEEKEND, vec![Some(0); n]),
        ])
        .unwrap()
    }

    #[test]
    fn test_null_target_is_kept() {
        let df = daily_columns(
            vec![Some(6000.0), None],
            vec![Some(0.0), Some(0.5)],
            vec![Some(2019), Some(2019)],
        );
        let rows = daily_from_frame(&df, Path::new("dataset_daily.parquet")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].load_mw_daily_mean, Some(6000.0));
        assert_eq!(rows[1].load_mw_daily_mean, None);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2019, 1, 2).unwrap());
        assert_eq!(rows[1].precip_mm_sum, 0.5);
    }

    #[test]
    fn test_null_precipitation_is_rejected() {
        let df = daily_columns(
            vec![Some(6000.0), Some(6100.0)],
            vec![Some(0.0), None],
            vec![Some(2019), Some(2019)],
        );
        match daily_from_frame(&df, Path::new("dataset_daily.parquet")) {
            Err(PipelineError::NullValue { column, row, .. }) => {
                assert_eq!(column, columns::PRECIP_MM_SUM);
                assert_eq!(row, 1);
            }
            other => panic!("Expected NullValue error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_calendar_cell_is_rejected() {
        let df = daily_columns(vec![Some(6000.0)], vec![Some(0.0)], vec![None]);
        match daily_from_frame(&df, Path::new("dataset_daily.parquet")) {
            Err(PipelineError::NullValue { column, row, .. }) => {
                assert_eq!(column, columns::YEAR);
                assert_eq!(row, 0);
            }
            other => panic!("Expected NullValue error, got {:?}", other),
        }
    }

    #[test]
    fn test_nanosecond_timestamps_are_accepted() {
        let nanos = at(2, 5).and_utc().timestamp_nanos_opt().unwrap();
        let df = DataFrame::new(vec![
            Column::new(columns::TIME.into(), vec![nanos])
                .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))
                .unwrap(),
            Column::new(columns::LOAD_MW.into(), vec![7.0]),
        ])
        .unwrap();
        let rows = hourly_load_from_frame(&df, Path::new("load.parquet")).unwrap();
        assert_eq!(rows, vec![HourlyLoad { time: at(2, 5), load_mw: 7.0 }]);
    }
}
