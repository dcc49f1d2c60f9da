//! Pipeline orchestration.
//!
//! Each stage reads its inputs from disk and fully regenerates its artifact,
//! so stages can be run on their own or chained by [`Pipeline::run`]:
//!
//! ```text
//! load CSVs ──ingest_load──> hourly load ──┐
//!                                          ├──build_dataset──> dataset_daily.{parquet,csv}
//! weather JSON ──normalize_weather──> hourly weather ──┘
//! ```

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::FileDiscovery, writer::ArtifactWriter};

use crate::aggregate::build_daily_dataset;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{
    BuildReport, DatasetArtifacts, NormalizeReport, RawLoadTable, RunSummary, WeatherReport,
};
use crate::normalize::{log_normalize_report, normalize_load};
use crate::reader::read_load_file;
use crate::report::CoverageReport;
use crate::weather::{load_open_meteo, log_weather_report};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the load/weather pipeline stages against one configuration
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    writer: ArtifactWriter,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid configurations
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let writer = ArtifactWriter::new(config.compression);
        Ok(Self { config, writer })
    }

    /// Read every load export, normalize them and persist the hourly table
    ///
    /// A file whose delimiter cannot be detected aborts the stage before
    /// anything is written.
    pub fn ingest_load(&self) -> Result<NormalizeReport> {
        println!("{}", "Ingesting load exports".bright_green().bold());
        println!("  {} {}", "Pattern:".bright_cyan(), self.config.load_glob);

        let files = FileDiscovery::new(self.config.load_glob.as_str()).discover_load_files()?;
        println!(
            "  {} {} load files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        );

        let tables = self.read_tables(&files)?;
        let (rows, report) = normalize_load(&tables, &self.config.country_code);
        log_normalize_report(&report);

        self.writer
            .write_hourly_load(&rows, &self.config.hourly_load_path)?;
        print_load_summary(&report, &self.config.hourly_load_path);
        Ok(report)
    }

    fn read_tables(&self, files: &[PathBuf]) -> Result<Vec<RawLoadTable>> {
        let pb = if self.config.show_progress {
            ProgressBar::new(files.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Reading files");

        let mut tables = Vec::with_capacity(files.len());
        for file in files {
            let table = match read_load_file(file, &self.config.required_columns) {
                Ok(table) => table,
                Err(e) => {
                    pb.abandon_with_message("Aborted");
                    return Err(e);
                }
            };
            if table.is_empty() {
                warn!("{} has a header but no rows", file.display());
            }
            debug!(
                "Read {} rows from {} (delimiter {:?})",
                table.len(),
                file.display(),
                table.delimiter as char
            );
            tables.push(table);
            pb.inc(1);
        }
        pb.finish_with_message("Files read");
        Ok(tables)
    }

    /// Convert the cached weather response into the hourly weather table
    pub fn normalize_weather(&self) -> Result<WeatherReport> {
        println!("\n{}", "Normalizing weather".bright_green().bold());
        println!(
            "  {} {}",
            "Source:".bright_cyan(),
            self.config.weather_source.display()
        );

        let (rows, report) = load_open_meteo(
            &self.config.weather_source,
            self.config.weather_window.as_ref(),
        )?;
        log_weather_report(&report);

        self.writer
            .write_hourly_weather(&rows, &self.config.hourly_weather_path)?;
        println!(
            "  {} {} hourly rows to {}",
            "Wrote".bright_green(),
            report.rows_kept.to_string().bright_white().bold(),
            self.config.hourly_weather_path.display()
        );
        if let (Some(first), Some(last)) = (report.first_time, report.last_time) {
            println!("  {} {} to {}", "Range:".bright_cyan(), first, last);
        }
        Ok(report)
    }

    /// Resample both hourly tables, join them and publish the daily dataset
    pub fn build_dataset(&self) -> Result<(BuildReport, DatasetArtifacts)> {
        println!("\n{}", "Building daily dataset".bright_green().bold());

        let load = self.writer.read_hourly_load(&self.config.hourly_load_path)?;
        let weather = self
            .writer
            .read_hourly_weather(&self.config.hourly_weather_path)?;
        info!(
            "Building from {} hourly load rows and {} hourly weather rows",
            load.len(),
            weather.len()
        );

        let (rows, report) = build_daily_dataset(&load, &weather);
        let artifacts = self.writer.write_daily_dataset(
            &rows,
            &self.config.dataset_parquet_path(),
            &self.config.dataset_csv_path(),
        )?;

        print_build_summary(&report, &artifacts);
        Ok((report, artifacts))
    }

    /// Read the published dataset back and summarize its coverage
    pub fn report(&self) -> Result<CoverageReport> {
        let path = self.config.dataset_parquet_path();
        let rows = self.writer.read_daily_dataset(&path)?;
        let report = CoverageReport::from_rows(&rows);
        report.print();
        Ok(report)
    }

    /// Run every stage in order
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();

        let load = self.ingest_load()?;
        let weather = self.normalize_weather()?;
        let (build, artifacts) = self.build_dataset()?;

        let processing_time_ms = start_time.elapsed().as_millis();
        println!(
            "\n  {} {}ms",
            "Time elapsed:".bright_cyan(),
            processing_time_ms.to_string().bright_white()
        );

        Ok(RunSummary {
            load,
            weather,
            build,
            artifacts,
            processing_time_ms,
        })
    }
}

fn print_load_summary(report: &NormalizeReport, output: &std::path::Path) {
    println!(
        "  {} {} rows ({} other region, {} dropped)",
        "Read".bright_cyan(),
        report.rows_read.to_string().bright_white(),
        report.rows_other_region,
        report.rows_dropped()
    );
    if report.unparseable_timestamps > 0 {
        println!(
            "  {} {}",
            "Unparseable timestamps:".bright_yellow(),
            report.unparseable_timestamps.to_string().bright_yellow().bold()
        );
    }
    for (pattern, count) in &report.rows_per_pattern {
        debug!("{} rows parsed with {}", count, pattern);
    }

    println!("  {}", "Coverage per year:".bright_cyan());
    for (year, hours) in &report.rows_per_year {
        println!("    {}: {} hours", year, hours.to_string().bright_white());
    }
    if report.missing_days > 0 {
        println!(
            "  {} {}",
            "Days without data:".bright_yellow(),
            report.missing_days.to_string().bright_yellow().bold()
        );
    }
    println!(
        "  {} {} hourly rows to {}",
        "Wrote".bright_green(),
        report.rows_kept.to_string().bright_white().bold(),
        output.display()
    );
}

fn print_build_summary(report: &BuildReport, artifacts: &DatasetArtifacts) {
    println!(
        "  {} {} load days, {} weather days",
        "Joined".bright_cyan(),
        report.load_days,
        report.weather_days
    );
    if report.load_only_days > 0 || report.weather_only_days > 0 {
        println!(
            "  {} {} load-only, {} weather-only",
            "Unmatched days:".bright_yellow(),
            report.load_only_days,
            report.weather_only_days
        );
    }
    println!(
        "  {} {}",
        "Rows:".bright_cyan(),
        artifacts.rows.to_string().bright_white().bold()
    );
    match (report.first_date, report.last_date) {
        (Some(first), Some(last)) => {
            println!("  {} {} to {}", "Date range:".bright_cyan(), first, last)
        }
        _ => println!("  {}", "Dataset is empty".bright_yellow()),
    }
    println!(
        "  {} {}",
        "Parquet:".bright_cyan(),
        artifacts.parquet.display()
    );
    println!("  {} {}", "CSV:".bright_cyan(), artifacts.csv.display());
}
