//! # Closecast Cross-Validation
//!
//! Time-ordered K-fold evaluation of model configurations. Folds are
//! contiguous blocks; each is validated by a model trained only on the
//! samples that precede it, so no fold ever sees its own future.
//!
//! ## Public API
//!
//! - `CrossValidationEngine`: runs every `(config, fold)` pair on the rayon pool.
//! - `make_folds`: the blocked partition, exposed for property tests.
//! - `CvReport`: per-configuration aggregates with the error ranking.

pub mod engine;
pub mod error;
pub mod folds;
pub mod report;

pub use engine::CrossValidationEngine;
pub use error::CvError;
pub use folds::{make_folds, Fold};
pub use report::{
    error_order, ConfigEvaluation, CvReport, FoldResult, FoldStatus, MetricSummary, ModelStatus, OutOfFold,
};
