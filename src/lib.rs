//! Load/weather dataset builder
//!
//! Builds a reproducible daily feature dataset for electricity-load
//! forecasting from two sources:
//! - ENTSO-E hourly load exports (CSV, delimiter varies per file)
//! - Open-Meteo hourly weather archive responses (JSON)
//!
//! The hourly tables are normalized, resampled to calendar days, joined on
//! date and enriched with calendar features before being published as
//! Parquet and CSV.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod schema;
pub mod weather;

pub use config::{CompressionAlgorithm, DateWindow, PipelineConfig, RequiredColumns};
pub use error::{PipelineError, Result};
pub use models::{
    BuildReport, DailyFeatureRow, DatasetArtifacts, HourlyLoad, HourlyWeather, NormalizeReport,
    RunSummary, WeatherReport,
};
pub use pipeline::Pipeline;
pub use report::CoverageReport;
