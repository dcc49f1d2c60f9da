//! Artifact writing and reading for pipeline stages
//!
//! Every artifact is written to a temporary sibling file and renamed into
//! place, so a failed run leaves the previous artifact untouched.

use crate::config::CompressionAlgorithm;
use crate::error::{PipelineError, Result};
use crate::models::{DailyFeatureRow, DatasetArtifacts, HourlyLoad, HourlyWeather};
use crate::schema;
use crate::weather::ensure_canonical;

use polars::prelude::{CsvWriter, DataFrame, ParquetReader, ParquetWriter, SerReader, SerWriter};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes and reads the Parquet/CSV artifacts of a run
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    compression: CompressionAlgorithm,
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(CompressionAlgorithm::Snappy)
    }
}

impl ArtifactWriter {
    pub fn new(compression: CompressionAlgorithm) -> Self {
        Self { compression }
    }

    /// Persist the canonical hourly load table
    pub fn write_hourly_load(&self, rows: &[HourlyLoad], path: &Path) -> Result<usize> {
        let mut df = schema::hourly_load_frame(rows)?;
        self.write_parquet(&mut df, path)?;
        Ok(df.height())
    }

    /// Persist the canonical hourly weather table
    pub fn write_hourly_weather(&self, rows: &[HourlyWeather], path: &Path) -> Result<usize> {
        let mut df = schema::hourly_weather_frame(rows)?;
        self.write_parquet(&mut df, path)?;
        Ok(df.height())
    }

    /// Persist the daily dataset as `<prefix>.parquet` and `<prefix>.csv`
    ///
    /// Both files are staged before either is renamed into place; a failure
    /// at any step removes the staged files.
    pub fn write_daily_dataset(
        &self,
        rows: &[DailyFeatureRow],
        parquet_path: &Path,
        csv_path: &Path,
    ) -> Result<DatasetArtifacts> {
        let mut df = schema::daily_frame(rows)?;
        let parquet_tmp = self.stage_parquet(&mut df, parquet_path)?;
        let csv_tmp = match self.stage_csv(&mut df, csv_path) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&parquet_tmp);
                return Err(e);
            }
        };
        // Parquet goes last: the report stage reads it
        commit(&[(csv_tmp, csv_path), (parquet_tmp, parquet_path)])?;
        debug!(
            "Published {} rows to {} and {}",
            df.height(),
            parquet_path.display(),
            csv_path.display()
        );
        Ok(DatasetArtifacts {
            parquet: parquet_path.to_path_buf(),
            csv: csv_path.to_path_buf(),
            rows: df.height(),
        })
    }

    /// Write a frame as Parquet with the configured compression
    pub fn write_parquet(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let tmp = self.stage_parquet(df, path)?;
        commit(&[(tmp, path)])?;
        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }

    fn stage_parquet(&self, df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
        let compression = self.compression.to_polars_compression();
        stage(path, |file| {
            ParquetWriter::new(file)
                .with_compression(compression)
                .finish(df)
                .map(|_| ())
        })
    }

    fn stage_csv(&self, df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
        stage(path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .with_separator(b',')
                .finish(df)
        })
    }

    pub fn read_hourly_load(&self, path: &Path) -> Result<Vec<HourlyLoad>> {
        let df = read_parquet(path)?;
        let mut rows = schema::hourly_load_from_frame(&df, path)?;
        if !rows.is_sorted_by_key(|row| row.time) {
            rows.sort_by_key(|row| row.time);
        }
        Ok(rows)
    }

    pub fn read_hourly_weather(&self, path: &Path) -> Result<Vec<HourlyWeather>> {
        let df = read_parquet(path)?;
        let mut rows = schema::hourly_weather_from_frame(&df, path)?;
        ensure_canonical(&mut rows, path)?;
        Ok(rows)
    }

    pub fn read_daily_dataset(&self, path: &Path) -> Result<Vec<DailyFeatureRow>> {
        let df = read_parquet(path)?;
        schema::daily_from_frame(&df, path)
    }
}

/// Read a Parquet artifact produced by an earlier stage
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Sibling path used while an artifact is being written
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Run `write` against the temporary sibling of `path` and return it
fn stage<F>(path: &Path, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut File) -> polars::prelude::PolarsResult<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::write_failure(parent, e))?;
    }

    let tmp = temporary_path(path);
    let result = File::create(&tmp)
        .map_err(|e| PipelineError::write_failure(&tmp, e))
        .and_then(|mut file| {
            write(&mut file).map_err(|e| PipelineError::write_failure(path, e))?;
            file.sync_all()
                .map_err(|e| PipelineError::write_failure(path, e))
        });

    match result {
        Ok(()) => Ok(tmp),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Rename staged files over their destinations in order
///
/// On the first failed rename every file not yet renamed is removed.
fn commit(staged: &[(PathBuf, &Path)]) -> Result<()> {
    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, path) {
            for (pending, _) in &staged[i..] {
                let _ = fs::remove_file(pending);
            }
            return Err(PipelineError::write_failure(*path, e));
        }
    }
    Ok(())
}
