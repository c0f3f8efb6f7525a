//! # Closecast Analytics
//!
//! Pure calculators shared by the cross-validation, simulation and comparison
//! stages. Nothing here knows about models or files.
//!
//! ## Public API
//!
//! - `RegressionMetrics`: RMSE, MAE and R² of one validation fold.
//! - `MetricAccumulator`: a mergeable running mean / standard deviation.
//! - `Drawdown`: peak-to-trough decline of a Decimal equity curve.
//! - `diagnostics`: correlation, error spread and calibration fit of out-of-fold predictions.

pub mod accumulator;
pub mod diagnostics;
pub mod drawdown;
pub mod error;
pub mod regression;

pub use accumulator::MetricAccumulator;
pub use diagnostics::{describe, error_std, linear_fit, pearson, Describe, LinearFit};
pub use drawdown::Drawdown;
pub use error::AnalyticsError;
pub use regression::RegressionMetrics;
