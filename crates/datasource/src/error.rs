use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Unknown symbol '{0}'. Run `closecast symbols` to list the available ones.")]
    UnknownSymbol(String),

    #[error("No price file for '{symbol}' at {path}")]
    NotFound { symbol: String, path: PathBuf },

    #[error("Malformed price data for '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("Failed to read price file: {0}")]
    Read(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
