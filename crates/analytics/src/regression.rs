use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use smartcore::metrics::{mean_absolute_error, mean_squared_error, r2};

/// Validation scores for one fold, in price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Undefined (NaN) when the actual values are constant.
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self, AnalyticsError> {
        if actual.len() != predicted.len() {
            return Err(AnalyticsError::LengthMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(AnalyticsError::NotEnoughData(
                "regression metrics need at least one observation".to_string(),
            ));
        }

        let y_true = actual.to_vec();
        let y_pred = predicted.to_vec();
        let rmse = mean_squared_error(&y_true, &y_pred).sqrt();
        let mae = mean_absolute_error(&y_true, &y_pred);
        let r2 = if is_constant(actual) {
            tracing::debug!(observations = actual.len(), "Constant target; R² left undefined.");
            f64::NAN
        } else {
            r2(&y_true, &y_pred)
        };

        tracing::trace!(observations = actual.len(), rmse, mae, r2, "Computed regression metrics.");
        Ok(Self { rmse, mae, r2 })
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn scores_a_known_residual_pattern() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.0, 2.0, 4.5];
        let m = RegressionMetrics::compute(&actual, &predicted).unwrap();

        // squared errors 0.25, 0, 1, 0.25
        assert_abs_diff_eq!(m.rmse, (1.5_f64 / 4.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.mae, 0.5, epsilon = 1e-12);
        // ss_tot = 5
        assert_abs_diff_eq!(m.r2, 1.0 - 1.5 / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn perfect_predictions_score_zero_error() {
        let actual = [10.0, 12.0, 11.0];
        let m = RegressionMetrics::compute(&actual, &actual).unwrap();
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_abs_diff_eq!(m.r2, 1.0);
    }

    #[test]
    fn r2_is_undefined_for_a_constant_target() {
        let m = RegressionMetrics::compute(&[5.0, 5.0, 5.0], &[5.0, 6.0, 4.0]).unwrap();
        assert!(m.r2.is_nan());
        assert!(m.rmse > 0.0);
    }

    #[test]
    fn rejects_mismatched_or_empty_input() {
        assert_eq!(
            RegressionMetrics::compute(&[1.0, 2.0], &[1.0]),
            Err(AnalyticsError::LengthMismatch { expected: 2, actual: 1 })
        );
        assert!(matches!(
            RegressionMetrics::compute(&[], &[]),
            Err(AnalyticsError::NotEnoughData(_))
        ));
    }
}
