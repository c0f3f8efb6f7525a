//! Descriptive statistics over out-of-fold predictions.
//!
//! All functions return `None` when the statistic is undefined (too few
//! points, zero variance or mismatched lengths) instead of a NaN.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub mean: f64,
    /// Sample standard deviation; 0 for a single value.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Slope and intercept of `predicted ≈ slope * actual + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(Describe { mean, std, min, max })
}

pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let (cov, var_a, var_b) = co_moments(a, b)?;
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}

/// Standard deviation of `predicted - actual`.
pub fn error_std(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.len() < 2 {
        return None;
    }
    let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| p - a).collect();
    describe(&errors).map(|d| d.std)
}

pub fn linear_fit(actual: &[f64], predicted: &[f64]) -> Option<LinearFit> {
    let (cov, var_actual, _) = co_moments(actual, predicted)?;
    if var_actual <= 0.0 {
        return None;
    }
    let slope = cov / var_actual;
    let n = actual.len() as f64;
    let intercept = predicted.iter().sum::<f64>() / n - slope * actual.iter().sum::<f64>() / n;
    Some(LinearFit { slope, intercept })
}

/// Sums of centred cross products and squares.
fn co_moments(a: &[f64], b: &[f64]) -> Option<(f64, f64, f64)> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    Some(a.iter().zip(b).fold((0.0, 0.0, 0.0), |(cov, va, vb), (x, y)| {
        let (dx, dy) = (x - mean_a, y - mean_b);
        (cov + dx * dy, va + dx * dx, vb + dy * dy)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn describe_reports_sample_statistics() {
        let d = describe(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!((d.mean, d.min, d.max), (4.0, 2.0, 6.0));
        assert_abs_diff_eq!(d.std, 2.0, epsilon = 1e-12);
        assert_eq!(describe(&[]), None);
    }

    #[test]
    fn pearson_of_affine_series_is_one() {
        let a = [1.0, 2.0, 3.0, 5.0];
        let b: Vec<f64> = a.iter().map(|x| 3.0 * x + 1.0).collect();
        assert_abs_diff_eq!(pearson(&a, &b).unwrap(), 1.0, epsilon = 1e-12);
        let neg: Vec<f64> = a.iter().map(|x| -x).collect();
        assert_abs_diff_eq!(pearson(&a, &neg).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&a, &[1.0, 1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn linear_fit_recovers_calibration_line() {
        let actual = [10.0, 11.0, 13.0, 16.0];
        let predicted: Vec<f64> = actual.iter().map(|x| 0.5 * x + 4.0).collect();
        let fit = linear_fit(&actual, &predicted).unwrap();
        assert_abs_diff_eq!(fit.slope, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_bias_has_zero_error_spread() {
        let actual = [1.0, 4.0, 2.0];
        let predicted = [2.0, 5.0, 3.0];
        assert_abs_diff_eq!(error_std(&actual, &predicted).unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(error_std(&actual, &predicted[..2]), None);
    }
}
