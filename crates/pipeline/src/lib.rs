//! # Closecast Pipeline
//!
//! Wires the workspace together for a single `predict` invocation:
//! load a series, window it, cross-validate the model bank, replay each
//! usable model's out-of-fold forecasts through the profit simulator,
//! compare the two rankings and refit the winner for the next close.
//!
//! The pipeline is synchronous and CPU-bound. Callers that need to stay
//! responsive (the CLI) run it on a blocking thread and raise the shared
//! cancel flag to stop it between folds.

pub mod error;
pub mod pipeline;
pub mod run;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use run::{Forecast, ModelOutcome, PredictedVsActual, PredictionPoint, PredictionRun, SeriesSummary};
