use indicatif::style::TemplateError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CvError {
    #[error("Fold count must satisfy 2 <= k <= {samples} (number of samples), got k = {k}")]
    InvalidFoldCount { k: usize, samples: usize },

    #[error("Cross-validation was cancelled before all folds finished")]
    Cancelled,

    #[error("Failed to build the training thread pool: {0}")]
    ThreadPool(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for CvError {
    fn from(error: TemplateError) -> Self {
        CvError::ProgressBarTemplate(error.to_string())
    }
}
