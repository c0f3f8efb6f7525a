use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Series lengths differ: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}
