//! Held-out evaluation.
//!
//! The test split is read as one window, imputed with the same policies as
//! training and scored per target. Each target is evaluated independently: a
//! missing or incompatible snapshot fails that target's report only.

use aerocast_training::{
    DatasetCursor, DomainSpec, Frame, Imputer, ModelSnapshot, ModelStore, OnlineRegressor, RegressionMetrics,
    StandardScaler, TrainingError, TrainingResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ModelNotFound,
    /// Snapshot could not be read or decoded.
    Load,
    SchemaMismatch,
    UnknownTarget,
    Prediction,
}

impl FailureKind {
    fn of(err: &TrainingError) -> Self {
        match err {
            TrainingError::ModelNotFound(_) => Self::ModelNotFound,
            TrainingError::SchemaMismatch(_) => Self::SchemaMismatch,
            TrainingError::UnknownTarget(_) => Self::UnknownTarget,
            TrainingError::Io(_) | TrainingError::Json(_) => Self::Load,
            _ => Self::Prediction,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ModelNotFound => "model_not_found",
            Self::Load => "load",
            Self::SchemaMismatch => "schema_mismatch",
            Self::UnknownTarget => "unknown_target",
            Self::Prediction => "prediction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetOutcome {
    Scored { metrics: RegressionMetrics },
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: String,
    pub outcome: TargetOutcome,
}

impl TargetReport {
    #[must_use]
    pub fn metrics(&self) -> Option<&RegressionMetrics> {
        match &self.outcome {
            TargetOutcome::Scored { metrics } => Some(metrics),
            TargetOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub domain: String,
    /// Rows in the held-out window.
    pub rows: usize,
    pub evaluated_at: DateTime<Utc>,
    pub targets: Vec<TargetReport>,
}

impl EvaluationReport {
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.target == target)
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.targets.iter().filter(|t| t.metrics().is_none()).count()
    }
}

/// Scores persisted models against a domain's test split.
pub struct Evaluator<'a> {
    store: &'a dyn ModelStore,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ModelStore) -> Self {
        Self { store }
    }

    /// Evaluate `targets` of `domain`.
    ///
    /// Errors reading the test split are fatal. Everything after that is
    /// reported per target.
    pub fn evaluate(&self, domain: &DomainSpec, targets: &[String]) -> TrainingResult<EvaluationReport> {
        tracing::info!("reading test data");
        let mut features = Frame::default();
        let mut truth = Frame::default();
        let fw = DatasetCursor::new(domain.test.features.clone()).read_all(&mut features)?;
        let tw = DatasetCursor::new(domain.test.targets.clone()).read_all(&mut truth)?;
        if fw.rows != tw.rows {
            return Err(TrainingError::RowMisalignment { features: fw.rows, targets: tw.rows });
        }

        let imputer = Imputer::new(domain.target_fill);
        imputer.impute_features(&mut features);
        imputer.impute_targets(&mut truth);
        tracing::debug!(rows = fw.rows, "test data imputed");

        // Models trained without persisted statistics are scored on
        // test-window statistics.
        let mut fresh = features.clone();
        StandardScaler::new().fit_transform(&mut fresh)?;

        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let outcome = match self.score(target, &features, &fresh, &truth) {
                Ok(metrics) => {
                    tracing::info!(target_name = %target, "{target}: {metrics}");
                    TargetOutcome::Scored { metrics }
                }
                Err(err) => {
                    tracing::warn!(target_name = %target, "{target} not evaluated: {err}");
                    TargetOutcome::Failed { kind: FailureKind::of(&err), message: err.to_string() }
                }
            };
            reports.push(TargetReport { target: target.clone(), outcome });
        }

        Ok(EvaluationReport { domain: domain.name.clone(), rows: fw.rows, evaluated_at: Utc::now(), targets: reports })
    }

    fn score(&self, target: &str, raw: &Frame, fresh: &Frame, truth: &Frame) -> TrainingResult<RegressionMetrics> {
        let snapshot: ModelSnapshot = self.store.load(target)?;
        raw.ensure_same_columns(&snapshot.feature_columns)?;
        let y = truth.column(target).ok_or_else(|| TrainingError::UnknownTarget(target.to_string()))?;

        let pred = match &snapshot.scaler {
            Some(state) => {
                let mut scaled = raw.clone();
                state.transform(&mut scaled)?;
                snapshot.regressor.predict(&scaled)?
            }
            None => snapshot.regressor.predict(fresh)?,
        };
        tracing::debug!(target_name = %target, "{target} predicted");

        RegressionMetrics::compute(y, &pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerocast_training::{
        CsvSource, DatasetPair, FillPolicy, FsModelStore, ModelLayout, Regressor, RegressorSpec,
    };
    use std::path::Path;
    use tempfile::TempDir;

    fn write_test_split(dir: &Path) {
        std::fs::write(dir.join("x.csv"), ",f\n0,1\n1,2\n2,3\n3,\n").unwrap();
        std::fs::write(dir.join("y.csv"), "t,u,flat\n2,,5\n4,1,5\n6,,5\n,1,5\n").unwrap();
    }

    fn domain(dir: &Path, fill: FillPolicy) -> DomainSpec {
        let pair = DatasetPair {
            features: CsvSource::with_index_column(dir.join("x.csv")),
            targets: CsvSource::new(dir.join("y.csv")),
        };
        DomainSpec {
            name: "unit".to_string(),
            train: pair.clone(),
            test: pair,
            targets: vec!["t".to_string(), "u".to_string(), "flat".to_string()],
            target_fill: fill,
        }
    }

    fn save_constant_model(store: &FsModelStore, target: &str, value: f64) {
        let x = Frame::from_columns(vec![("f".to_string(), vec![0.0])]).unwrap();
        let mut regressor = Regressor::from_spec(&RegressorSpec::default());
        regressor.partial_fit(&x, &[0.0]).unwrap();
        if let Regressor::Sgd(m) = &mut regressor {
            m.state.intercept = value;
        }
        let snapshot = ModelSnapshot {
            target: target.to_string(),
            domain: "unit".to_string(),
            feature_columns: vec!["f".to_string()],
            scaler: None,
            regressor,
            saved_at: Utc::now(),
        };
        store.save(target, &snapshot).unwrap();
    }

    #[test]
    fn test_missing_model_fails_only_that_target() {
        let temp = TempDir::new().unwrap();
        write_test_split(temp.path());
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        save_constant_model(&store, "t", 4.0);

        let report = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Median), &["t".to_string(), "u".to_string()])
            .unwrap();

        assert_eq!(report.rows, 4);
        // t imputed with its median (4): [2, 4, 6, 4], predicted 4 everywhere
        let t = report.get("t").unwrap().metrics().unwrap();
        assert!((t.mse - 2.0).abs() < 1e-9);
        assert_eq!(t.r2, Some(0.0));
        assert!(matches!(
            report.get("u").unwrap().outcome,
            TargetOutcome::Failed { kind: FailureKind::ModelNotFound, .. }
        ));
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn test_zero_fill_targets_and_undefined_r2() {
        let temp = TempDir::new().unwrap();
        write_test_split(temp.path());
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        save_constant_model(&store, "u", 0.5);
        save_constant_model(&store, "flat", 5.0);

        let report = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Zero), &["u".to_string(), "flat".to_string()])
            .unwrap();

        // u zero-filled: [0, 1, 0, 1]
        let u = report.get("u").unwrap().metrics().unwrap();
        assert!((u.mse - 0.25).abs() < 1e-9);
        let flat = report.get("flat").unwrap().metrics().unwrap();
        assert_eq!(flat.r2, None);
        assert_eq!(flat.mse, 0.0);
    }

    #[test]
    fn test_feature_schema_mismatch_is_per_target() {
        let temp = TempDir::new().unwrap();
        write_test_split(temp.path());
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        save_constant_model(&store, "t", 4.0);
        let mut other = store.load("t").unwrap();
        other.feature_columns = vec!["g".to_string()];
        store.save("u", &other).unwrap();

        let report = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Median), &["t".to_string(), "u".to_string()])
            .unwrap();

        assert!(report.get("t").unwrap().metrics().is_some());
        assert!(matches!(
            report.get("u").unwrap().outcome,
            TargetOutcome::Failed { kind: FailureKind::SchemaMismatch, .. }
        ));
    }

    #[test]
    fn test_report_json_shape() {
        let temp = TempDir::new().unwrap();
        write_test_split(temp.path());
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        save_constant_model(&store, "flat", 5.0);

        let report = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Median), &["flat".to_string(), "t".to_string()])
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["targets"][0]["outcome"]["status"], "scored");
        assert!(json["targets"][0]["outcome"]["metrics"]["r2"].is_null());
        assert_eq!(json["targets"][1]["outcome"]["status"], "failed");
        assert_eq!(json["targets"][1]["outcome"]["kind"], "model_not_found");
    }

    #[test]
    fn test_short_test_targets_is_row_misalignment() {
        let temp = TempDir::new().unwrap();
        write_test_split(temp.path());
        std::fs::write(temp.path().join("y.csv"), "t,u,flat\n2,,5\n4,1,5\n").unwrap();
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        save_constant_model(&store, "t", 4.0);

        let err = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Median), &["t".to_string()])
            .unwrap_err();
        assert!(matches!(err, TrainingError::RowMisalignment { features: 4, targets: 2 }));
    }

    #[test]
    fn test_unreadable_test_split_is_fatal() {
        let temp = TempDir::new().unwrap();
        let store = FsModelStore::new(ModelLayout::new(temp.path().join("models")));
        let err = Evaluator::new(&store)
            .evaluate(&domain(temp.path(), FillPolicy::Median), &["t".to_string()])
            .unwrap_err();
        assert!(matches!(err, TrainingError::SourceUnavailable { .. }));
    }
}
