//! Feature standardization.
//!
//! `StandardScaler` refits its statistics on every `fit_transform` call.
//! `RunningScaler` accumulates statistics across windows (Chan's parallel
//! form of Welford's update) so a model can be trained and evaluated against
//! one consistent set of statistics.

use crate::error::{TrainingError, TrainingResult};
use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// Which scaling strategy a training run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerMode {
    /// Refit on each training chunk; evaluation refits on the test window.
    #[default]
    PerChunk,
    /// Accumulate over all chunks and persist the result with each model.
    Running,
}

impl std::fmt::Display for ScalerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerChunk => f.write_str("per_chunk"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// Per-column mean and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerState {
    /// Population mean and standard deviation of each column.
    #[must_use]
    pub fn fit(frame: &Frame) -> Self {
        let mut mean = Vec::with_capacity(frame.n_cols());
        let mut scale = Vec::with_capacity(frame.n_cols());
        let n = frame.n_rows() as f64;
        for idx in 0..frame.n_cols() {
            let column = frame.column_at(idx);
            let m = if column.is_empty() { 0.0 } else { column.iter().sum::<f64>() / n };
            let var = if column.is_empty() { 0.0 } else { column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n };
            mean.push(m);
            scale.push(safe_scale(var.sqrt()));
        }
        Self { columns: frame.columns().to_vec(), mean, scale }
    }

    /// Standardize `frame` in place with these statistics.
    pub fn transform(&self, frame: &mut Frame) -> TrainingResult<()> {
        frame.ensure_same_columns(&self.columns)?;
        for idx in 0..frame.n_cols() {
            let (m, s) = (self.mean[idx], self.scale[idx]);
            for v in frame.column_at_mut(idx) {
                *v = (*v - m) / s;
            }
        }
        Ok(())
    }
}

fn safe_scale(sd: f64) -> f64 {
    if sd == 0.0 || !sd.is_finite() { 1.0 } else { sd }
}

/// Scaler whose state is whatever window it was last fit on.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    state: Option<ScalerState>,
}

impl StandardScaler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    /// Fit on `frame`, store the statistics and standardize `frame` with them.
    pub fn fit_transform(&mut self, frame: &mut Frame) -> TrainingResult<()> {
        let state = ScalerState::fit(frame);
        state.transform(frame)?;
        self.state = Some(state);
        Ok(())
    }

    /// Standardize with the stored statistics without refitting.
    pub fn transform(&self, frame: &mut Frame) -> TrainingResult<()> {
        self.state
            .as_ref()
            .ok_or_else(|| TrainingError::NotFitted("scaler has not been fit".to_string()))?
            .transform(frame)
    }
}

/// Streaming (count, mean, M2) accumulator per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningScaler {
    columns: Vec<String>,
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningScaler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Merge the statistics of `frame` into the accumulator.
    pub fn partial_fit(&mut self, frame: &Frame) -> TrainingResult<()> {
        if frame.is_empty() {
            return Ok(());
        }
        if self.count == 0 {
            self.columns = frame.columns().to_vec();
            self.mean = vec![0.0; frame.n_cols()];
            self.m2 = vec![0.0; frame.n_cols()];
        } else {
            frame.ensure_same_columns(&self.columns)?;
        }

        let n_b = frame.n_rows() as f64;
        let n_a = self.count as f64;
        let total = n_a + n_b;
        for idx in 0..frame.n_cols() {
            let column = frame.column_at(idx);
            let mean_b = column.iter().sum::<f64>() / n_b;
            let m2_b = column.iter().map(|v| (v - mean_b).powi(2)).sum::<f64>();
            let delta = mean_b - self.mean[idx];
            self.mean[idx] += delta * n_b / total;
            self.m2[idx] += m2_b + delta * delta * n_a * n_b / total;
        }
        self.count += frame.n_rows() as u64;
        Ok(())
    }

    /// Current statistics as a `ScalerState` (population variance).
    pub fn state(&self) -> TrainingResult<ScalerState> {
        if self.count == 0 {
            return Err(TrainingError::NotFitted("running scaler has seen no rows".to_string()));
        }
        let n = self.count as f64;
        Ok(ScalerState {
            columns: self.columns.clone(),
            mean: self.mean.clone(),
            scale: self.m2.iter().map(|m2| safe_scale((m2 / n).sqrt())).collect(),
        })
    }
}
