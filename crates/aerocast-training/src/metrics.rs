use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// Accuracy of one target's predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination. `None` when the true values have zero
    /// variance and the score is undefined.
    pub r2: Option<f64>,
    pub mse: f64,
    pub rmse: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> TrainingResult<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TrainingError::Metric(format!(
                "{} true values but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(TrainingError::Metric("no values to score".to_string()));
        }

        let n = y_true.len() as f64;
        let mean = y_true.iter().sum::<f64>() / n;
        let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

        let mse = ss_res / n;
        let r2 = if ss_tot == 0.0 { None } else { Some(1.0 - ss_res / ss_tot) };
        Ok(Self { r2, mse, rmse: mse.sqrt() })
    }
}

impl std::fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.r2 {
            Some(r2) => write!(f, "r2={r2} ")?,
            None => write!(f, "r2=undefined ")?,
        }
        write!(f, "mse={} rmse={}", self.mse, self.rmse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let m = RegressionMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(m.r2, Some(1.0));
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.rmse, 0.0);
    }

    #[test]
    fn test_known_values() {
        // residuals 1, -1, 0, 2 -> ss_res 6; mean 2.5 -> ss_tot 5
        let m = RegressionMetrics::compute(&[1.0, 2.0, 3.0, 4.0], &[0.0, 3.0, 3.0, 2.0]).unwrap();
        assert!((m.mse - 1.5).abs() < 1e-12);
        assert!((m.rmse - 1.5f64.sqrt()).abs() < 1e-12);
        assert!((m.r2.unwrap() - (1.0 - 6.0 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_target_has_undefined_r2() {
        let m = RegressionMetrics::compute(&[2.0, 2.0], &[1.0, 3.0]).unwrap();
        assert_eq!(m.r2, None);
        assert!((m.mse - 1.0).abs() < 1e-12);
        assert!(m.to_string().contains("r2=undefined"));
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(RegressionMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(RegressionMetrics::compute(&[], &[]).is_err());
    }
}
