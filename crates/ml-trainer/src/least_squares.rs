use crate::error::ModelError;
use core_types::FeatureWindow;
use ml_features::{feature_matrix, labels, FeatureScaler, PolynomialBasis};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Ordinary least squares on a standardised, polynomially expanded feature vector.
///
/// Degree 1 is plain linear regression. The intercept is recovered from the
/// column means, so it is never shrunk by the minimum-norm solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquaresModel {
    scaler: FeatureScaler,
    basis: PolynomialBasis,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LeastSquaresModel {
    pub fn fit(samples: &[FeatureWindow], degree: usize) -> Result<Self, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let y = labels(samples);
        let (scaler, basis, design) = {
            let x = feature_matrix(samples)?;
            if x.iter().chain(&y).any(|v| !v.is_finite()) {
                return Err(ModelError::Diverged("training data contains non-finite values".to_string()));
            }
            let mut scaler = FeatureScaler::new();
            scaler.fit(&x)?;
            let basis = PolynomialBasis::new(x.ncols(), degree)?;
            let design = basis.expand(&scaler.transform(&x)?)?;
            (scaler, basis, design)
        };

        let column_means = design
            .mean_axis(Axis(0))
            .ok_or(ModelError::EmptyTrainingSet)?;
        let a = centred_dmatrix(design, &column_means);
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;
        let b = DVector::from_iterator(y.len(), y.iter().map(|v| v - y_mean));
        let beta = min_norm_least_squares(&a, &b);

        let intercept = y_mean - column_means.iter().zip(beta.iter()).map(|(m, c)| m * c).sum::<f64>();
        let coefficients: Vec<f64> = beta.iter().copied().collect();
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Diverged(format!(
                "least-squares solution of degree {degree} is not finite"
            )));
        }

        tracing::debug!(
            degree,
            rows = a.nrows(),
            columns = a.ncols(),
            "Fitted least-squares model."
        );

        Ok(Self {
            scaler,
            basis,
            coefficients,
            intercept,
        })
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let expanded = self.basis.expand_row(&self.scaler.transform_row(features)?)?;
        Ok(self.intercept
            + expanded
                .iter()
                .zip(&self.coefficients)
                .map(|(x, c)| x * c)
                .sum::<f64>())
    }
}

/// Consumes the expanded design so only the centred copy outlives the fit.
fn centred_dmatrix(design: Array2<f64>, column_means: &Array1<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(design.nrows(), design.ncols(), |i, j| design[[i, j]] - column_means[j])
}

/// Minimum-norm solution of `min ||A x - b||`.
///
/// Works on whichever Gram matrix is smaller: `AᵀA` when A is tall, `AAᵀ`
/// when it is wide (high polynomial degrees on short histories).
fn min_norm_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    let (rows, cols) = a.shape();
    if cols <= rows {
        let gram = a.tr_mul(a);
        let rhs = a.tr_mul(b);
        pseudo_inverse_solve(gram, &rhs)
    } else {
        let gram = a * a.transpose();
        let dual = pseudo_inverse_solve(gram, b);
        a.tr_mul(&dual)
    }
}

/// Solves `M x = rhs` for symmetric positive semi-definite `M` through its
/// eigendecomposition, discarding directions whose eigenvalue is numerically zero.
fn pseudo_inverse_solve(m: DMatrix<f64>, rhs: &DVector<f64>) -> DVector<f64> {
    let dim = m.nrows();
    let eigen = SymmetricEigen::new(m);
    let largest = eigen.eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = largest * dim as f64 * f64::EPSILON;

    let projected = eigen.eigenvectors.tr_mul(rhs);
    let scaled = DVector::from_iterator(
        dim,
        projected
            .iter()
            .zip(eigen.eigenvalues.iter())
            .map(|(p, &lambda)| if lambda > cutoff { p / lambda } else { 0.0 }),
    );
    &eigen.eigenvectors * scaled
}
