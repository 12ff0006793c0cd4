//! Online regressors.
//!
//! The pipeline only relies on the `OnlineRegressor` contract: one call to
//! `partial_fit` per window, `predict` any time after the first fit or after
//! loading a snapshot. Both learners here are linear with a fitted intercept
//! and process rows in window order, so training is deterministic.

use crate::error::{TrainingError, TrainingResult};
use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// Incrementally trainable single-output regressor.
pub trait OnlineRegressor {
    /// One incremental update from `x` (rows) and the aligned targets `y`.
    fn partial_fit(&mut self, x: &Frame, y: &[f64]) -> TrainingResult<()>;

    /// One prediction per row of `x`.
    fn predict(&self, x: &Frame) -> TrainingResult<Vec<f64>>;

    /// Rows consumed by `partial_fit` so far.
    fn samples_seen(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningRate {
    Constant,
    /// `eta0 / t^power_t`
    InvScaling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdParams {
    /// L2 penalty.
    pub alpha: f64,
    pub eta0: f64,
    pub power_t: f64,
    pub learning_rate: LearningRate,
}

impl Default for SgdParams {
    fn default() -> Self {
        Self { alpha: 1e-4, eta0: 0.01, power_t: 0.25, learning_rate: LearningRate::InvScaling }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveAggressiveParams {
    /// Maximum step size.
    pub c: f64,
    /// Width of the insensitive zone.
    pub epsilon: f64,
}

impl Default for PassiveAggressiveParams {
    fn default() -> Self {
        Self { c: 1.0, epsilon: 0.1 }
    }
}

/// Which learner to build for every target of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorSpec {
    Sgd(SgdParams),
    PassiveAggressive(PassiveAggressiveParams),
}

impl Default for RegressorSpec {
    fn default() -> Self {
        Self::Sgd(SgdParams::default())
    }
}

impl RegressorSpec {
    pub fn validate(&self) -> TrainingResult<()> {
        match self {
            Self::Sgd(p) => {
                if !p.eta0.is_finite() || p.eta0 <= 0.0 {
                    return Err(TrainingError::InvalidSpec("sgd eta0 must be > 0".to_string()));
                }
                if !p.alpha.is_finite() || p.alpha < 0.0 {
                    return Err(TrainingError::InvalidSpec("sgd alpha must be >= 0".to_string()));
                }
            }
            Self::PassiveAggressive(p) => {
                if !p.c.is_finite() || p.c <= 0.0 {
                    return Err(TrainingError::InvalidSpec("passive-aggressive c must be > 0".to_string()));
                }
                if !p.epsilon.is_finite() || p.epsilon < 0.0 {
                    return Err(TrainingError::InvalidSpec("passive-aggressive epsilon must be >= 0".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Weights, intercept and sample count shared by the linear learners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearState {
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub samples_seen: u64,
    fitted: bool,
}

impl LinearState {
    fn prepare(&mut self, x: &Frame, y: &[f64]) -> TrainingResult<()> {
        if x.n_rows() != y.len() {
            return Err(TrainingError::RowMisalignment { features: x.n_rows(), targets: y.len() });
        }
        if !self.fitted {
            self.weights = vec![0.0; x.n_cols()];
            self.fitted = true;
        } else if self.weights.len() != x.n_cols() {
            return Err(TrainingError::SchemaMismatch(format!(
                "model has {} weights, window has {} feature columns",
                self.weights.len(),
                x.n_cols()
            )));
        }
        Ok(())
    }

    fn decision(&self, x: &Frame, row: usize) -> f64 {
        x.row_dot(row, &self.weights) + self.intercept
    }

    fn predict(&self, x: &Frame) -> TrainingResult<Vec<f64>> {
        if !self.fitted {
            return Err(TrainingError::NotFitted("regressor has not been trained".to_string()));
        }
        if self.weights.len() != x.n_cols() {
            return Err(TrainingError::SchemaMismatch(format!(
                "model has {} weights, input has {} feature columns",
                self.weights.len(),
                x.n_cols()
            )));
        }
        Ok((0..x.n_rows()).map(|row| self.decision(x, row)).collect())
    }
}

/// Squared-loss SGD with L2 penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdRegressor {
    pub params: SgdParams,
    pub state: LinearState,
    /// Step counter for the learning-rate schedule; persists across calls.
    t: f64,
}

impl SgdRegressor {
    #[must_use]
    pub fn new(params: SgdParams) -> Self {
        Self { params, state: LinearState::default(), t: 1.0 }
    }

    fn eta(&self) -> f64 {
        match self.params.learning_rate {
            LearningRate::Constant => self.params.eta0,
            LearningRate::InvScaling => self.params.eta0 / self.t.powf(self.params.power_t),
        }
    }
}

impl OnlineRegressor for SgdRegressor {
    fn partial_fit(&mut self, x: &Frame, y: &[f64]) -> TrainingResult<()> {
        self.state.prepare(x, y)?;
        for (row, target) in y.iter().enumerate() {
            let eta = self.eta();
            let dloss = self.state.decision(x, row) - target;
            let decay = (1.0 - eta * self.params.alpha).max(0.0);
            for (w, xi) in self.state.weights.iter_mut().zip(x.row_values(row)) {
                *w = *w * decay - eta * dloss * xi;
            }
            self.state.intercept -= eta * dloss;
            self.t += 1.0;
        }
        self.state.samples_seen += y.len() as u64;
        Ok(())
    }

    fn predict(&self, x: &Frame) -> TrainingResult<Vec<f64>> {
        self.state.predict(x)
    }

    fn samples_seen(&self) -> u64 {
        self.state.samples_seen
    }
}

/// PA-I regression with epsilon-insensitive loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveAggressiveRegressor {
    pub params: PassiveAggressiveParams,
    pub state: LinearState,
}

impl PassiveAggressiveRegressor {
    #[must_use]
    pub fn new(params: PassiveAggressiveParams) -> Self {
        Self { params, state: LinearState::default() }
    }
}

impl OnlineRegressor for PassiveAggressiveRegressor {
    fn partial_fit(&mut self, x: &Frame, y: &[f64]) -> TrainingResult<()> {
        self.state.prepare(x, y)?;
        for (row, target) in y.iter().enumerate() {
            let residual = target - self.state.decision(x, row);
            let loss = residual.abs() - self.params.epsilon;
            if loss <= 0.0 {
                continue;
            }
            // The intercept acts as a constant feature of 1.
            let norm = x.row_sq_norm(row) + 1.0;
            let step = (loss / norm).min(self.params.c) * residual.signum();
            for (w, xi) in self.state.weights.iter_mut().zip(x.row_values(row)) {
                *w += step * xi;
            }
            self.state.intercept += step;
        }
        self.state.samples_seen += y.len() as u64;
        Ok(())
    }

    fn predict(&self, x: &Frame) -> TrainingResult<Vec<f64>> {
        self.state.predict(x)
    }

    fn samples_seen(&self) -> u64 {
        self.state.samples_seen
    }
}

/// A learner resolved from a `RegressorSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Sgd(SgdRegressor),
    PassiveAggressive(PassiveAggressiveRegressor),
}

impl Regressor {
    #[must_use]
    pub fn from_spec(spec: &RegressorSpec) -> Self {
        match spec {
            RegressorSpec::Sgd(p) => Self::Sgd(SgdRegressor::new(p.clone())),
            RegressorSpec::PassiveAggressive(p) => Self::PassiveAggressive(PassiveAggressiveRegressor::new(p.clone())),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sgd(_) => "sgd",
            Self::PassiveAggressive(_) => "passive_aggressive",
        }
    }

    #[must_use]
    pub fn linear_state(&self) -> &LinearState {
        match self {
            Self::Sgd(m) => &m.state,
            Self::PassiveAggressive(m) => &m.state,
        }
    }
}

impl OnlineRegressor for Regressor {
    fn partial_fit(&mut self, x: &Frame, y: &[f64]) -> TrainingResult<()> {
        match self {
            Self::Sgd(m) => m.partial_fit(x, y),
            Self::PassiveAggressive(m) => m.partial_fit(x, y),
        }
    }

    fn predict(&self, x: &Frame) -> TrainingResult<Vec<f64>> {
        match self {
            Self::Sgd(m) => m.predict(x),
            Self::PassiveAggressive(m) => m.predict(x),
        }
    }

    fn samples_seen(&self) -> u64 {
        match self {
            Self::Sgd(m) => m.samples_seen(),
            Self::PassiveAggressive(m) => m.samples_seen(),
        }
    }
}
