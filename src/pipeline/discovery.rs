//! Load file discovery
//!
//! Resolves the configured glob pattern into the ordered list of monthly
//! ENTSO-E exports to ingest.

use crate::error::{PipelineError, Result};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File discovery component for load exports
#[derive(Debug)]
pub struct FileDiscovery {
    pattern: String,
}

impl FileDiscovery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Discover every file matching the pattern, sorted by path
    ///
    /// Unreadable directory entries are skipped with a warning. An empty
    /// match set is an error since there is nothing to ingest.
    pub fn discover_load_files(&self) -> Result<Vec<PathBuf>> {
        debug!("Searching for load files matching: {}", self.pattern);

        let mut files = Vec::new();
        for entry in glob(&self.pattern)? {
            match entry {
                Ok(path) if is_csv_file(&path) => files.push(path),
                Ok(path) => debug!("Skipping non-CSV match {}", path.display()),
                Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e),
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::InputNotFound {
                pattern: self.pattern.clone(),
            });
        }

        debug!("Found {} load files", files.len());
        Ok(files)
    }
}

/// Check if a path is a regular CSV file
fn is_csv_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
