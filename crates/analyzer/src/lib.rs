//! # Closecast Analyzer
//!
//! The sink of the pipeline: ranks usable models by validation error and by
//! simulated profit, and joins both rankings into one record per model.
//!
//! ## Public API
//!
//! - `ComparisonReporter`: builds a `Comparison` from a `CvReport` and the completed simulations.
//! - `ComparisonRecord`: error rank, profit rank, balance, RMSE and diagnostics of one model.
//! - `AnalyzerError`: the specific error types that can be returned from this crate.

pub mod comparison;
pub mod error;

pub use comparison::{Comparison, ComparisonRecord, ComparisonReporter, Diagnostics};
pub use error::AnalyzerError;
