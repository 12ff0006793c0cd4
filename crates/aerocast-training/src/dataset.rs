use crate::error::{TrainingError, TrainingResult};
use crate::frame::Frame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which half of a domain's data a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    Train,
    Test,
}

impl std::fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => f.write_str("train"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// A CSV file with a header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvSource {
    pub path: PathBuf,
    /// First column is a row index and is never exposed as data.
    #[serde(default)]
    pub index_column: bool,
}

impl CsvSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), index_column: false }
    }

    #[must_use]
    pub fn with_index_column(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), index_column: true }
    }
}

/// Outcome of one cursor pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// Data rows read into the window.
    pub rows: usize,
    /// Fewer rows than requested were available.
    pub exhausted: bool,
}

/// Stateless windowed reader over a `CsvSource`.
///
/// Every call reopens the source and skips `offset` data rows, so the caller
/// owns the position. Only the current window is ever held in memory.
#[derive(Debug, Clone)]
pub struct DatasetCursor {
    source: CsvSource,
}

impl DatasetCursor {
    #[must_use]
    pub fn new(source: CsvSource) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.source.path
    }

    /// Refill `frame` with up to `size` rows starting at data row `offset`.
    ///
    /// Columns holding any value that does not parse as a number are dropped
    /// from the window. Empty cells and `NA`/`NaN` markers become `NaN`.
    pub fn read_window(&self, offset: usize, size: usize, frame: &mut Frame) -> TrainingResult<WindowStatus> {
        let path = &self.source.path;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| TrainingError::source_unavailable(path, e))?;

        let skip = usize::from(self.source.index_column);
        let headers = reader.headers().map_err(|e| TrainingError::source_unavailable(path, e))?;
        if headers.len() <= skip {
            return Err(TrainingError::SchemaMismatch(format!("{} has no data columns", path.display())));
        }
        frame.reset(headers.iter().skip(skip));

        let mut numeric = vec![true; frame.n_cols()];
        let mut record = csv::StringRecord::new();

        let mut skipped = 0;
        while skipped < offset {
            if !reader.read_record(&mut record).map_err(|e| TrainingError::source_unavailable(path, e))? {
                break;
            }
            skipped += 1;
        }

        let mut rows = 0;
        while rows < size {
            if !reader.read_record(&mut record).map_err(|e| TrainingError::source_unavailable(path, e))? {
                break;
            }
            for (idx, field) in record.iter().skip(skip).enumerate() {
                let value = parse_field(field).unwrap_or_else(|| {
                    numeric[idx] = false;
                    f64::NAN
                });
                frame.push_value(idx, value);
            }
            rows += 1;
        }

        if rows == 0 && offset == 0 {
            return Err(TrainingError::NoData(path.clone()));
        }

        if numeric.iter().any(|n| !n) {
            frame.retain_columns(&numeric);
        }
        if rows > 0 && frame.n_cols() == 0 {
            return Err(TrainingError::SchemaMismatch(format!("{} has no numeric columns", path.display())));
        }

        tracing::debug!(path = %path.display(), offset, rows, columns = frame.n_cols(), "window read");
        Ok(WindowStatus { rows, exhausted: rows < size })
    }

    /// Read the whole source as a single window.
    pub fn read_all(&self, frame: &mut Frame) -> TrainingResult<WindowStatus> {
        self.read_window(0, usize::MAX, frame)
    }
}

/// `Some(NaN)` for a missing cell, `Some(v)` for a number, `None` for text.
fn parse_field(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || matches!(raw, "NA" | "N/A" | "null" | "NULL" | "None") {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}
