use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Model '{label}' refers to sample {index}, but only {available} labels were supplied")]
    MissingSample {
        label: String,
        index: usize,
        available: usize,
    },
}
