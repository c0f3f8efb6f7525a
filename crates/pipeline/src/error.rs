use analyzer::AnalyzerError;
use crossval::CvError;
use datasource::DataError;
use ml_features::FeatureError;
use ml_trainer::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Feature error: {0}")]
    Features(#[from] FeatureError),

    #[error("Cross-validation error: {0}")]
    CrossValidation(CvError),

    #[error("Final model error: {0}")]
    Model(#[from] ModelError),

    #[error("Comparison error: {0}")]
    Analysis(#[from] AnalyzerError),

    #[error("The run was cancelled")]
    Cancelled,
}

impl From<CvError> for PipelineError {
    fn from(error: CvError) -> Self {
        match error {
            CvError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::CrossValidation(other),
        }
    }
}
