//! Command-line interface components.

use crate::config::{CompressionAlgorithm, DateWindow, PipelineConfig};
use crate::error::Result;
use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build a daily electricity-load and weather feature dataset
#[derive(Parser, Debug)]
#[command(name = "load_weather_processor")]
#[command(about = "Build a daily load/weather feature dataset from ENTSO-E and Open-Meteo exports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Glob matching the raw load exports
    #[arg(long, global = true, value_name = "PATTERN")]
    pub load_glob: Option<String>,

    /// Region kept from the load exports
    #[arg(long, global = true, value_name = "CODE")]
    pub country: Option<String>,

    /// Cached Open-Meteo archive response
    #[arg(long, global = true, value_name = "PATH")]
    pub weather_source: Option<PathBuf>,

    /// First day of the weather window (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE", requires = "weather_end")]
    pub weather_start: Option<NaiveDate>,

    /// Last day of the weather window (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE", requires = "weather_start")]
    pub weather_end: Option<NaiveDate>,

    /// Keep every weather row regardless of date
    #[arg(long, global = true, conflicts_with = "weather_start")]
    pub no_weather_window: bool,

    /// Canonical hourly load artifact
    #[arg(long, global = true, value_name = "PATH")]
    pub hourly_load: Option<PathBuf>,

    /// Canonical hourly weather artifact
    #[arg(long, global = true, value_name = "PATH")]
    pub hourly_weather: Option<PathBuf>,

    /// Final dataset path prefix; `.parquet` and `.csv` are appended
    #[arg(short, long, global = true, value_name = "PREFIX")]
    pub output_prefix: Option<PathBuf>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, global = true)]
    pub compression: Option<String>,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Pipeline stages
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Read the load exports and write the hourly load table
    IngestLoad,
    /// Convert the cached weather response into the hourly weather table
    Weather,
    /// Build the daily dataset from both hourly tables
    Build,
    /// Print a coverage report of the published dataset
    Report,
    /// Run ingest-load, weather and build in order
    Run,
}

impl Args {
    /// Log level implied by the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Resolve the configuration file (or defaults) and apply flag overrides
    pub fn build_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(pattern) = &self.load_glob {
            config = config.with_load_glob(pattern.as_str());
        }
        if let Some(code) = &self.country {
            config = config.with_country_code(code.as_str());
        }
        if let Some(path) = &self.weather_source {
            config = config.with_weather_source(path);
        }
        if let (Some(start), Some(end)) = (self.weather_start, self.weather_end) {
            config = config.with_weather_window(Some(DateWindow { start, end }));
        }
        if self.no_weather_window {
            config = config.with_weather_window(None);
        }
        if let Some(path) = &self.hourly_load {
            config = config.with_hourly_load_path(path);
        }
        if let Some(path) = &self.hourly_weather {
            config = config.with_hourly_weather_path(path);
        }
        if let Some(prefix) = &self.output_prefix {
            config = config.with_dataset_prefix(prefix);
        }
        if let Some(name) = &self.compression {
            config = config.with_compression(CompressionAlgorithm::from_name(name)?);
        }
        if self.quiet {
            config = config.without_progress();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute the selected stage
pub fn execute(args: &Args) -> Result<()> {
    let pipeline = Pipeline::new(args.build_config()?)?;
    match args.command {
        Commands::IngestLoad => pipeline.ingest_load().map(|_| ()),
        Commands::Weather => pipeline.normalize_weather().map(|_| ()),
        Commands::Build => pipeline.build_dataset().map(|_| ()),
        Commands::Report => pipeline.report().map(|_| ()),
        Commands::Run => pipeline.run().map(|_| ()),
    }
}
