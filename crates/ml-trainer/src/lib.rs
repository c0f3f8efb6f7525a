//! The model bank: one MLP regressor and a family of least-squares
//! regressors (linear and polynomial) behind a uniform `fit` / `predict`.

pub mod error;
pub mod least_squares;
pub mod mlp;
pub mod model;

pub use error::ModelError;
pub use least_squares::LeastSquaresModel;
pub use mlp::{MlpFit, MlpModel};
pub use model::{FitOutcome, ModelConfig, TrainedModel, MAX_POLYNOMIAL_DEGREE, MIN_POLYNOMIAL_DEGREE};
