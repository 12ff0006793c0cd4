use crate::error::{TrainingError, TrainingResult};
use crate::frame::Frame;
use crate::regressor::{OnlineRegressor, Regressor, RegressorSpec};
use std::collections::BTreeMap;

/// One independent regressor per target column.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    models: BTreeMap<String, Regressor>,
}

impl ModelSet {
    /// Fresh, untrained models for `targets`, all built from `spec`.
    #[must_use]
    pub fn new(targets: &[String], spec: &RegressorSpec) -> Self {
        let models = targets.iter().map(|t| (t.clone(), Regressor::from_spec(spec))).collect();
        Self { models }
    }

    pub fn insert(&mut self, target: impl Into<String>, model: Regressor) {
        self.models.insert(target.into(), model);
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<&Regressor> {
        self.models.get(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Update `target`'s model with row i of `features` predicting row i of
    /// `targets[target]`. Other models are not touched.
    pub fn update(&mut self, features: &Frame, targets: &Frame, target: &str) -> TrainingResult<()> {
        let y = targets.column(target).ok_or_else(|| TrainingError::UnknownTarget(target.to_string()))?;
        if features.n_rows() != y.len() {
            return Err(TrainingError::RowMisalignment { features: features.n_rows(), targets: y.len() });
        }
        let model = self.models.get_mut(target).ok_or_else(|| TrainingError::UnknownTarget(target.to_string()))?;
        model.partial_fit(features, y)
    }

    pub fn predict(&self, features: &Frame, target: &str) -> TrainingResult<Vec<f64>> {
        self.models
            .get(target)
            .ok_or_else(|| TrainingError::UnknownTarget(target.to_string()))?
            .predict(features)
    }

    pub fn into_models(self) -> impl Iterator<Item = (String, Regressor)> {
        self.models.into_iter()
    }
}
