use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
    #[error("Insufficient data: a window of {window} needs more than {window} closes, series has {len}")]
    InsufficientData { window: usize, len: usize },

    #[error("Feature scaler used before it was fitted")]
    ScalerNotFitted,

    #[error("Expected {expected} features per row, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Polynomial degree must be at least 1, got {0}")]
    InvalidDegree(usize),
}
