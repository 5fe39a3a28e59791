//! Survey file scanner
//!
//! Finds `*.json` survey files in a study's survey folder. Matching follows
//! shell glob `*` rules: hidden files are never matched and only the file
//! name is compared. Results are sorted by path so batch order is stable.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extension of survey files
pub const SURVEY_SUFFIX: &str = ".json";

/// Suffix of files produced by a legacy conversion
pub const CONVERTED_SUFFIX: &str = ".v1.json";

/// Survey file scanner
#[derive(Debug, Clone)]
pub struct SurveyScanner {
    recursive: bool,
}

impl SurveyScanner {
    /// Create a scanner limited to the top level of the folder
    pub fn new() -> Self {
        Self { recursive: false }
    }

    /// Descend into nested folders as well
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Scan a folder for survey files
    ///
    /// A missing or unreadable folder yields an empty list. A survey name
    /// whose target cannot be accessed (e.g. a dangling symlink) is still
    /// listed in order, so reading it fails at its place in the batch.
    /// A symlink loop on a survey name is an error.
    pub fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            tracing::debug!("Survey folder {} not found, nothing to scan", dir.display());
            return Ok(Vec::new());
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_survey_name(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => match e.path().map(Path::to_path_buf) {
                    Some(path) if e.depth() > 0 && is_survey_name(&path) => {
                        if e.io_error().is_none() {
                            return Err(Error::Read {
                                path,
                                source: std::io::Error::from(e),
                            });
                        }
                        files.push(path);
                    }
                    _ => tracing::warn!("Error accessing entry: {}", e),
                },
            }
        }

        tracing::debug!("{} survey files found in {}", files.len(), dir.display());
        Ok(files)
    }
}

impl Default for SurveyScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn file_name_ends_with(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

/// Visible `*.json` file name, the names a shell `*.json` glob matches
fn is_survey_name(path: &Path) -> bool {
    let visible = path
        .file_name()
        .map(|name| !name.to_string_lossy().starts_with('.'))
        .unwrap_or(false);
    visible && file_name_ends_with(path, SURVEY_SUFFIX)
}

/// True for files written by a previous conversion (`*.v1.json`)
pub fn is_converted_file(path: &Path) -> bool {
    file_name_ends_with(path, CONVERTED_SUFFIX)
}

/// Output path for a survey file: extension replaced by `.v1.json`
///
/// `surveys/weekly.json` becomes `surveys/weekly.v1.json`.
pub fn legacy_output_path(path: &Path) -> PathBuf {
    path.with_extension(&CONVERTED_SUFFIX[1..])
}
