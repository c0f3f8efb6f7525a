use ml_features::FeatureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("Polynomial degree must be within 2..=10, got {0}")]
    InvalidDegree(usize),

    #[error("Invalid MLP parameters: {0}")]
    InvalidParameters(String),

    #[error("Training diverged: {0}")]
    Diverged(String),

    #[error("Feature preparation failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("Failed to serialize model artifact: {0}")]
    Serialization(#[from] bincode::Error),
}
