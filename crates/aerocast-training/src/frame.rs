//! Column-major numeric window.
//!
//! A `Frame` is the unit every pipeline stage works on: the cursor fills it,
//! the imputer and scaler rewrite it in place and the regressors read it row
//! by row. Missing values are stored as `NaN`.
//!
//! Buffers are kept across `reset` calls so a frame refilled chunk after chunk
//! does not reallocate once it has reached the window size.

use crate::error::{TrainingError, TrainingResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl Frame {
    /// Build a frame from named columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> TrainingResult<Self> {
        let mut frame = Self::default();
        for (name, values) in columns {
            if let Some(first) = frame.data.first() {
                if first.len() != values.len() {
                    return Err(TrainingError::SchemaMismatch(format!(
                        "column {name} has {} rows, expected {}",
                        values.len(),
                        first.len()
                    )));
                }
            }
            frame.columns.push(name);
            frame.data.push(values);
        }
        Ok(frame)
    }

    /// Clear all rows and set the column names, keeping allocated buffers.
    pub fn reset<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.clear();
        self.columns.extend(columns.into_iter().map(Into::into));
        self.data.resize_with(self.columns.len(), Vec::new);
        for column in &mut self.data {
            column.clear();
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|idx| self.data[idx].as_slice())
    }

    #[must_use]
    pub fn column_at(&self, idx: usize) -> &[f64] {
        &self.data[idx]
    }

    pub fn column_at_mut(&mut self, idx: usize) -> &mut [f64] {
        &mut self.data[idx]
    }

    /// Append one value to column `idx`. Callers push a full row before reading.
    pub(crate) fn push_value(&mut self, idx: usize, value: f64) {
        self.data[idx].push(value);
    }

    /// Drop every column for which `keep` returns false.
    pub(crate) fn retain_columns(&mut self, keep: &[bool]) {
        let mut idx = 0;
        self.columns.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
        let mut idx = 0;
        self.data.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
    }

    /// Dot product of row `row` with `weights`.
    #[must_use]
    pub fn row_dot(&self, row: usize, weights: &[f64]) -> f64 {
        self.data.iter().zip(weights).map(|(col, w)| col[row] * w).sum()
    }

    /// Squared L2 norm of row `row`.
    #[must_use]
    pub fn row_sq_norm(&self, row: usize) -> f64 {
        self.data.iter().map(|col| col[row] * col[row]).sum()
    }

    /// Values of one row, in column order.
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().map(move |col| col[row])
    }

    /// Check that `other` carries the same column names in the same order.
    pub fn ensure_same_columns(&self, other: &[String]) -> TrainingResult<()> {
        if self.columns == other {
            return Ok(());
        }
        Err(TrainingError::SchemaMismatch(format!(
            "expected columns [{}], found [{}]",
            other.join(", "),
            self.columns.join(", ")
        )))
    }
}
