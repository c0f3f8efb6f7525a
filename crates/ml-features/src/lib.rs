//! # Feature Engineering
//!
//! Turns a price series into supervised samples and prepares feature
//! matrices for the regression models.
//!
//! - `window`: lagged-close samples in strict time order.
//! - `FeatureScaler`: per-column standardisation fitted on training rows only.
//! - `PolynomialBasis`: monomial expansion for the polynomial regressions.

pub mod error;
pub mod polynomial;
pub mod scaler;
pub mod window;

pub use error::FeatureError;
pub use polynomial::PolynomialBasis;
pub use scaler::FeatureScaler;
pub use window::{feature_matrix, feature_names, labels, window};
