//! Per-window missing-value imputation.
//!
//! Fill values are always derived from the window being filled. Nothing is
//! carried between windows.

use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// How missing cells of a column are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Median of the column's present values, or 0 when none are present.
    Median,
    /// Constant 0. Used where a missing reading means absence.
    Zero,
}

impl std::fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Median => f.write_str("median"),
            Self::Zero => f.write_str("zero"),
        }
    }
}

/// Median of the non-`NaN` values, `None` when every value is missing.
///
/// Even counts average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_unstable_by(f64::total_cmp);
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Fill the `NaN` cells of `values` and return the fill value used.
pub fn fill_column(values: &mut [f64], policy: FillPolicy) -> f64 {
    let fill = match policy {
        FillPolicy::Median => median(values).unwrap_or(0.0),
        FillPolicy::Zero => 0.0,
    };
    for v in values.iter_mut().filter(|v| v.is_nan()) {
        *v = fill;
    }
    fill
}

/// What one imputation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputeSummary {
    pub filled_cells: usize,
    /// Columns with no present value that were filled with 0.
    pub degenerate_columns: Vec<String>,
}

/// Imputation policy of one domain.
///
/// Features always use the window median. Targets use the domain's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imputer {
    target_fill: FillPolicy,
}

impl Imputer {
    #[must_use]
    pub fn new(target_fill: FillPolicy) -> Self {
        Self { target_fill }
    }

    #[must_use]
    pub fn target_fill(&self) -> FillPolicy {
        self.target_fill
    }

    pub fn impute_features(&self, frame: &mut Frame) -> ImputeSummary {
        impute_frame(frame, FillPolicy::Median)
    }

    pub fn impute_targets(&self, frame: &mut Frame) -> ImputeSummary {
        impute_frame(frame, self.target_fill)
    }
}

fn impute_frame(frame: &mut Frame, policy: FillPolicy) -> ImputeSummary {
    let mut summary = ImputeSummary::default();
    if frame.is_empty() {
        return summary;
    }
    for idx in 0..frame.n_cols() {
        let column = frame.column_at_mut(idx);
        let missing = column.iter().filter(|v| v.is_nan()).count();
        if missing == 0 {
            continue;
        }
        let degenerate = missing == column.len();
        fill_column(column, policy);
        summary.filled_cells += missing;
        if degenerate && policy == FillPolicy::Median {
            let name = frame.columns()[idx].clone();
            tracing::debug!(column = %name, "column entirely missing in window, filled with 0");
            summary.degenerate_columns.push(name);
        }
    }
    summary
}
