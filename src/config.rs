//! Configuration management and validation.
//!
//! Provides the pipeline configuration: input locations, the target
//! region, source column names, intermediate and final artifact paths and
//! Parquet output settings. Configuration can be loaded from a JSON file and
//! adjusted with the builder methods.

use crate::constants::{self, source_columns};
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }

    /// Parse a CLI compression name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(PipelineError::Configuration {
                message: format!(
                    "Unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                    other
                ),
            }),
        }
    }
}

/// Names of the columns the sniffing reader must find in every load file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredColumns {
    pub country_code: String,
    pub timestamp: String,
    pub value: String,
}

impl Default for RequiredColumns {
    fn default() -> Self {
        Self {
            country_code: source_columns::COUNTRY_CODE.to_string(),
            timestamp: source_columns::TIMESTAMP.to_string(),
            value: source_columns::VALUE.to_string(),
        }
    }
}

impl RequiredColumns {
    pub fn names(&self) -> [&str; 3] {
        [&self.country_code, &self.timestamp, &self.value]
    }
}

/// Closed date interval applied to the weather table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Global configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Glob matching the raw load exports
    pub load_glob: String,

    /// Region kept by the load normalizer (case-insensitive)
    pub country_code: String,

    /// Source column names the reader requires
    pub required_columns: RequiredColumns,

    /// Cached Open-Meteo archive response
    pub weather_source: PathBuf,

    /// Optional closed interval the weather table is restricted to
    pub weather_window: Option<DateWindow>,

    /// Canonical hourly load artifact
    pub hourly_load_path: PathBuf,

    /// Canonical hourly weather artifact
    pub hourly_weather_path: PathBuf,

    /// Final dataset path prefix (without extension)
    pub dataset_prefix: PathBuf,

    /// Parquet compression for every artifact
    pub compression: CompressionAlgorithm,

    /// Show file progress while reading load exports
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_glob: constants::DEFAULT_LOAD_GLOB.to_string(),
            country_code: constants::DEFAULT_COUNTRY_CODE.to_string(),
            required_columns: RequiredColumns::default(),
            weather_source: PathBuf::from(constants::DEFAULT_WEATHER_SOURCE),
            weather_window: Some(DateWindow {
                start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
                end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            }),
            hourly_load_path: PathBuf::from(constants::DEFAULT_HOURLY_LOAD_PATH),
            hourly_weather_path: PathBuf::from(constants::DEFAULT_HOURLY_WEATHER_PATH),
            dataset_prefix: PathBuf::from(constants::DEFAULT_DATASET_PREFIX),
            compression: CompressionAlgorithm::Snappy,
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::Configuration {
                message: format!("Config file not found: {}", path.display()),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a dataset
    pub fn validate(&self) -> Result<()> {
        if self.load_glob.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "load_glob must not be empty".to_string(),
            });
        }
        if self.country_code.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "country_code must not be empty".to_string(),
            });
        }
        if let Some(window) = &self.weather_window {
            if window.start > window.end {
                return Err(PipelineError::Configuration {
                    message: format!(
                        "weather window start {} is after end {}",
                        window.start, window.end
                    ),
                });
            }
        }
        if self.dataset_prefix.as_os_str().is_empty() {
            return Err(PipelineError::Configuration {
                message: "dataset_prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_load_glob(mut self, pattern: impl Into<String>) -> Self {
        self.load_glob = pattern.into();
        self
    }

    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    pub fn with_weather_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.weather_source = path.into();
        self
    }

    pub fn with_weather_window(mut self, window: Option<DateWindow>) -> Self {
        self.weather_window = window;
        self
    }

    pub fn with_hourly_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hourly_load_path = path.into();
        self
    }

    pub fn with_hourly_weather_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hourly_weather_path = path.into();
        self
    }

    pub fn with_dataset_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.dataset_prefix = prefix.into();
        self
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Disable progress bars (tests, quiet mode)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Final Parquet artifact path
    pub fn dataset_parquet_path(&self) -> PathBuf {
        with_suffix(&self.dataset_prefix, "parquet")
    }

    /// Final CSV artifact path
    pub fn dataset_csv_path(&self) -> PathBuf {
        with_suffix(&self.dataset_prefix, "csv")
    }
}

/// Append an extension without replacing a dotted stem like `dataset.v2`
fn with_suffix(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.country_code, "RO");
        assert_eq!(config.compression, CompressionAlgorithm::Snappy);
    }

    #[test]
    fn test_dataset_paths_share_prefix() {
        let config = PipelineConfig::default().with_dataset_prefix("out/dataset.v2");
        assert_eq!(config.dataset_parquet_path(), PathBuf::from("out/dataset.v2.parquet"));
        assert_eq!(config.dataset_csv_path(), PathBuf::from("out/dataset.v2.csv"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let config = PipelineConfig::default().with_weather_window(Some(DateWindow {
            start: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }));
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"country_code": "bg", "load_glob": "in/*.csv", "compression": "zstd"}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.country_code, "bg");
        assert_eq!(config.load_glob, "in/*.csv");
        assert_eq!(config.compression, CompressionAlgorithm::Zstd);
        assert_eq!(config.required_columns, RequiredColumns::default());
    }

    #[test]
    fn test_missing_config_file() {
        let result = PipelineConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(PipelineError::Configuration { .. })));
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(
            CompressionAlgorithm::from_name("SNAPPY").unwrap(),
            CompressionAlgorithm::Snappy
        );
        assert_eq!(
            CompressionAlgorithm::from_name("none").unwrap(),
            CompressionAlgorithm::Uncompressed
        );
        assert!(CompressionAlgorithm::from_name("brotli").is_err());
    }
}
