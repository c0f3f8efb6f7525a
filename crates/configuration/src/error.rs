use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("I/O error while preparing log directory: {0}")]
    Io(#[from] std::io::Error),
}
