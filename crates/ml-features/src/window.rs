use crate::error::FeatureError;
use core_types::{FeatureWindow, PriceSeries};
use ndarray::Array2;

/// Builds one sample per close that has `window` predecessors.
///
/// Sample `i - window` uses closes `[i - window, i)` as features and close `i`
/// as the label, anchored at date `i`. The output keeps the series order; it
/// must not be shuffled, since the forward cross-validation relies on it.
pub fn window(series: &PriceSeries, window: usize) -> Result<Vec<FeatureWindow>, FeatureError> {
    if window == 0 || series.len() <= window {
        return Err(FeatureError::InsufficientData {
            window,
            len: series.len(),
        });
    }

    let bars = series.bars();
    let samples: Vec<FeatureWindow> = (window..bars.len())
        .map(|i| FeatureWindow {
            features: bars[i - window..i].iter().map(|b| b.close).collect(),
            label: bars[i].close,
            anchor_date: bars[i].date,
        })
        .collect();

    tracing::debug!(
        symbol = series.symbol(),
        window,
        samples = samples.len(),
        "Built feature windows."
    );
    Ok(samples)
}

/// Column names matching the feature order; `lag_1` is the most recent close.
pub fn feature_names(window: usize) -> Vec<String> {
    (1..=window).rev().map(|lag| format!("lag_{lag}")).collect()
}

/// Stacks the feature vectors of `samples` into an `n x W` matrix.
pub fn feature_matrix(samples: &[FeatureWindow]) -> Result<Array2<f64>, FeatureError> {
    let width = samples.first().map(|s| s.features.len()).unwrap_or(0);
    let mut data = Vec::with_capacity(samples.len() * width);
    for sample in samples {
        if sample.features.len() != width {
            return Err(FeatureError::DimensionMismatch {
                expected: width,
                actual: sample.features.len(),
            });
        }
        data.extend_from_slice(&sample.features);
    }
    Array2::from_shape_vec((samples.len(), width), data).map_err(|_| FeatureError::DimensionMismatch {
        expected: width,
        actual: 0,
    })
}

pub fn labels(samples: &[FeatureWindow]) -> Vec<f64> {
    samples.iter().map(|s| s.label).collect()
}
