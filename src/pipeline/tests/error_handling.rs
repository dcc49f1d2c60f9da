//! Error handling tests

use super::{create_fixture, fixture_config, write_load_file};
use crate::config::{DateWindow, PipelineConfig};
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::pipeline::writer::ArtifactWriter;
use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_no_load_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = fixture_config(&temp_dir);
    let pattern = config.load_glob.clone();

    let result = Pipeline::new(config).unwrap().run();

    match result {
        Err(PipelineError::InputNotFound { pattern: reported }) => assert_eq!(reported, pattern),
        other => panic!("Expected InputNotFound error, got {:?}", other),
    }
}

#[test]
fn test_undetectable_file_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_03.csv",
        "This is not a load export\nat all\n",
    );
    let config = fixture_config(&temp_dir);

    let result = Pipeline::new(config.clone()).unwrap().run();

    match result {
        Err(PipelineError::FormatDetection { path, columns }) => {
            assert!(path.ends_with("monthly_hourly_load_values_2019_03.csv"));
            assert_eq!(columns, vec!["This is not a load export".to_string()]);
        }
        other => panic!("Expected FormatDetection error, got {:?}", other),
    }
    assert!(!config.hourly_load_path.exists());
    assert!(!config.dataset_parquet_path().exists());
}

#[test]
fn test_failed_ingest_keeps_previous_artifact() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    let config = fixture_config(&temp_dir);
    let pipeline = Pipeline::new(config.clone()).unwrap();
    pipeline.ingest_load().unwrap();

    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_03.csv",
        "Country|Date|MW\nRO|01-03-2019 00:00|1\n",
    );
    assert!(pipeline.ingest_load().is_err());

    let rows = ArtifactWriter::default()
        .read_hourly_load(&config.hourly_load_path)
        .unwrap();
    assert_eq!(rows.len(), 5);
}

#[test]
fn test_unparseable_rows_are_counted_not_raised() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01c.csv",
        "CountryCode;DateUTC;Value\nRO;2019-01-01T03:00;6100\nRO;01-01-2019 04:00;n/a\nRO;01-01-2019 05:00;\n",
    );

    let report = Pipeline::new(fixture_config(&temp_dir))
        .unwrap()
        .ingest_load()
        .unwrap();

    assert_eq!(report.unparseable_timestamps, 1);
    assert_eq!(report.non_numeric_values, 2);
    assert_eq!(report.rows_kept, 5);
    assert_eq!(report.rejected_samples.len(), 1);
    assert_eq!(report.rejected_samples[0].raw, "2019-01-01T03:00");
}

#[test]
fn test_short_rows_are_dropped_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01c.csv",
        "CountryCode,DateUTC,Value\nRO,01-01-2019 03:00,6100\nRO,01-01-2019 04:00\n",
    );
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01d.csv",
        "CountryCode\tDateUTC\tValue\nRO\t01-01-2019 05:00\n",
    );

    let report = Pipeline::new(fixture_config(&temp_dir))
        .unwrap()
        .ingest_load()
        .unwrap();

    assert_eq!(report.non_numeric_values, 2);
    assert_eq!(report.rows_kept, 6);
}

#[test]
fn test_header_only_export_is_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    write_load_file(
        temp_dir.path(),
        "monthly_hourly_load_values_2019_01c.csv",
        "CountryCode;DateUTC;Value\n",
    );

    let report = Pipeline::new(fixture_config(&temp_dir))
        .unwrap()
        .ingest_load()
        .unwrap();

    assert_eq!(report.files_read, 3);
    assert_eq!(report.rows_kept, 5);
}

#[test]
fn test_build_without_intermediates() {
    let temp_dir = TempDir::new().unwrap();
    let result = Pipeline::new(fixture_config(&temp_dir))
        .unwrap()
        .build_dataset();
    assert!(matches!(result, Err(PipelineError::ArtifactNotFound { .. })));
}

#[test]
fn test_report_without_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let result = Pipeline::new(fixture_config(&temp_dir)).unwrap().report();
    assert!(matches!(result, Err(PipelineError::ArtifactNotFound { .. })));
}

#[test]
fn test_missing_weather_source() {
    let temp_dir = TempDir::new().unwrap();
    let result = Pipeline::new(fixture_config(&temp_dir))
        .unwrap()
        .normalize_weather();
    assert!(matches!(result, Err(PipelineError::ArtifactNotFound { .. })));
}

#[test]
fn test_invalid_configuration_rejected() {
    let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let config = PipelineConfig::default().with_weather_window(Some(DateWindow {
        start: day,
        end: day.pred_opt().unwrap(),
    }));
    assert!(matches!(
        Pipeline::new(config),
        Err(PipelineError::Configuration { .. })
    ));
}

#[test]
fn test_unwritable_dataset_prefix() {
    let temp_dir = TempDir::new().unwrap();
    create_fixture(&temp_dir);
    let blocker = temp_dir.path().join("final_is_a_file");
    fs::write(&blocker, "x").unwrap();
    let config = fixture_config(&temp_dir).with_dataset_prefix(blocker.join("dataset_daily"));

    let result = Pipeline::new(config).unwrap().run();
    assert!(matches!(result, Err(PipelineError::WriteFailure { .. })));
}
