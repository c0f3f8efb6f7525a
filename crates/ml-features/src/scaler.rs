use crate::error::FeatureError;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardisation: `(x - mean) / std`.
///
/// Fitted on the training rows of a fold only, so validation rows never
/// influence the statistics they are scaled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
    fitted: bool,
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            stds: Vec::new(),
            fitted: false,
        }
    }

    pub fn fit(&mut self, data: &Array2<f64>) -> Result<(), FeatureError> {
        let (means, stds): (Vec<f64>, Vec<f64>) = data
            .axis_iter(Axis(1))
            .map(column_stats)
            .map(|s| (s.mean, s.std))
            .unzip();
        self.means = means;
        self.stds = stds;
        self.fitted = true;
        Ok(())
    }

    /// Fits a single-column scaler, used for regression targets.
    pub fn fit_values(values: &[f64]) -> Self {
        let stats = column_stats(ArrayView1::from(values));
        Self {
            means: vec![stats.mean],
            stds: vec![stats.std],
            fitted: true,
        }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        self.check_width(data.ncols())?;
        let mut scaled = data.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (self.means[j], self.stds[j]);
            column.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(scaled)
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (mean, std))| (v - mean) / std)
            .collect())
    }

    /// Scales a single value of column `col`.
    pub fn scale_value(&self, col: usize, value: f64) -> f64 {
        (value - self.means[col]) / self.stds[col]
    }

    /// Maps a standardised value of column `col` back to original units.
    pub fn unscale_value(&self, col: usize, value: f64) -> f64 {
        value * self.stds[col] + self.means[col]
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    fn check_width(&self, width: usize) -> Result<(), FeatureError> {
        if !self.fitted {
            return Err(FeatureError::ScalerNotFitted);
        }
        if width != self.means.len() {
            return Err(FeatureError::DimensionMismatch {
                expected: self.means.len(),
                actual: width,
            });
        }
        Ok(())
    }
}

struct Stats {
    mean: f64,
    std: f64,
}

/// Mean and sample standard deviation; a degenerate column gets std 1.
fn column_stats(column: ArrayView1<f64>) -> Stats {
    let n = column.len();
    if n == 0 {
        return Stats { mean: 0.0, std: 1.0 };
    }
    let mean = column.sum() / n as f64;
    let std = if n > 1 {
        (column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    // Avoid division by zero
    let std = if std < 1e-10 || !std.is_finite() { 1.0 } else { std };
    Stats { mean, std }
}
