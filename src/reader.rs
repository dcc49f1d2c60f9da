//! Delimiter sniffing for raw load exports.
//!
//! ENTSO-E exports arrive tab, semicolon or comma separated depending on
//! the month they were downloaded. Each candidate delimiter is tried in a
//! fixed order and the first one whose header holds all required columns
//! wins. Short records are kept with their missing fields read as empty;
//! a record longer than the header rejects the candidate. A forced
//! semicolon re-parse recovers files that collapse into a single `a;b;c`
//! column under the default delimiter.

use crate::config::RequiredColumns;
use crate::constants::{DEFAULT_DELIMITER, DELIMITER_CANDIDATES, FALLBACK_DELIMITER};
use crate::error::{PipelineError, Result};
use crate::models::{RawLoadRecord, RawLoadTable};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header and records of one parse attempt
#[derive(Debug)]
struct ParsedCsv {
    columns: Vec<String>,
    rows: Vec<StringRecord>,
}

impl ParsedCsv {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    fn has_columns(&self, required: &RequiredColumns) -> bool {
        required.names().iter().all(|name| self.position(name).is_some())
    }

    /// Number of records with more fields than the header
    fn overlong_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.len() > self.columns.len())
            .count()
    }
}

/// Read one raw load export, detecting its delimiter
pub fn read_load_file(path: &Path, required: &RequiredColumns) -> Result<RawLoadTable> {
    let bytes = std::fs::read(path)?;
    sniff_load_table(&bytes, path, required)
}

/// Detect the delimiter of `content` and extract the required columns.
///
/// `path` is only used for provenance and error messages.
pub fn sniff_load_table(
    content: &[u8],
    path: &Path,
    required: &RequiredColumns,
) -> Result<RawLoadTable> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    for delimiter in DELIMITER_CANDIDATES {
        match parse_with_delimiter(content, delimiter) {
            Ok(parsed) if parsed.has_columns(required) && parsed.overlong_rows() == 0 => {
                debug!(
                    "Detected delimiter {:?} for {} ({} rows)",
                    delimiter as char,
                    path.display(),
                    parsed.rows.len()
                );
                return Ok(into_table(parsed, path, delimiter, required));
            }
            Ok(parsed) if parsed.has_columns(required) => debug!(
                "Delimiter {:?} rejected for {}: {} rows longer than the header",
                delimiter as char,
                path.display(),
                parsed.overlong_rows()
            ),
            Ok(parsed) => debug!(
                "Delimiter {:?} rejected for {}: columns {:?}",
                delimiter as char,
                path.display(),
                parsed.columns
            ),
            Err(e) => debug!(
                "Delimiter {:?} failed for {}: {}",
                delimiter as char,
                path.display(),
                e
            ),
        }
    }

    let observed = match parse_with_delimiter(content, DEFAULT_DELIMITER) {
        Ok(parsed) if is_collapsed_header(&parsed) => {
            // Forced parse keeps over-long records, reading only the header's fields
            match parse_with_delimiter(content, FALLBACK_DELIMITER) {
                Ok(forced) if forced.has_columns(required) => {
                    warn!(
                        "Recovered {} by forcing {:?} on a single-column header",
                        path.display(),
                        FALLBACK_DELIMITER as char
                    );
                    return Ok(into_table(forced, path, FALLBACK_DELIMITER, required));
                }
                Ok(forced) => forced.columns,
                Err(_) => parsed.columns,
            }
        }
        Ok(parsed) => parsed.columns,
        Err(e) => {
            debug!("Default parse failed for {}: {}", path.display(), e);
            Vec::new()
        }
    };

    Err(PipelineError::FormatDetection {
        path: path.to_path_buf(),
        columns: observed,
    })
}

/// A single column whose name still contains the fallback delimiter
fn is_collapsed_header(parsed: &ParsedCsv) -> bool {
    parsed.columns.len() == 1 && parsed.columns[0].contains(FALLBACK_DELIMITER as char)
}

fn parse_with_delimiter(content: &[u8], delimiter: u8) -> std::result::Result<ParsedCsv, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let columns = reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ParsedCsv { columns, rows })
}

fn into_table(
    parsed: ParsedCsv,
    path: &Path,
    delimiter: u8,
    required: &RequiredColumns,
) -> RawLoadTable {
    let source = Arc::new(PathBuf::from(path));
    // has_columns() was checked by every caller
    let country_idx = parsed.position(&required.country_code).unwrap_or_default();
    let timestamp_idx = parsed.position(&required.timestamp).unwrap_or_default();
    let value_idx = parsed.position(&required.value).unwrap_or_default();

    let records = parsed
        .rows
        .iter()
        .map(|row| RawLoadRecord {
            country_code: row.get(country_idx).unwrap_or_default().to_string(),
            timestamp_raw: row.get(timestamp_idx).unwrap_or_default().to_string(),
            value_raw: row.get(value_idx).unwrap_or_default().to_string(),
            source: Arc::clone(&source),
        })
        .collect();

    RawLoadTable {
        source,
        delimiter,
        columns: parsed.columns,
        records,
    }
}
