use crate::error::FeatureError;
use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Expands a feature vector into every monomial of total degree `1..=degree`.
///
/// Terms are ordered by degree, then lexicographically by feature index
/// (`x0, x1, x0², x0·x1, x1², ...`). The constant term is omitted; the
/// regression fits the intercept separately. Degree 1 is the identity map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialBasis {
    n_features: usize,
    degree: usize,
    terms: Vec<Vec<usize>>,
}

impl PolynomialBasis {
    pub fn new(n_features: usize, degree: usize) -> Result<Self, FeatureError> {
        if degree == 0 {
            return Err(FeatureError::InvalidDegree(degree));
        }
        let terms = (1..=degree)
            .flat_map(|d| (0..n_features).combinations_with_replacement(d))
            .collect();
        Ok(Self {
            n_features,
            degree,
            terms,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of expanded columns: `C(n + d, d) - 1`.
    pub fn n_output_features(&self) -> usize {
        self.terms.len()
    }

    pub fn expand_row(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if row.len() != self.n_features {
            return Err(FeatureError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(self
            .terms
            .iter()
            .map(|term| term.iter().map(|&j| row[j]).product())
            .collect())
    }

    pub fn expand(&self, data: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        if data.ncols() != self.n_features {
            return Err(FeatureError::DimensionMismatch {
                expected: self.n_features,
                actual: data.ncols(),
            });
        }
        let width = self.n_output_features();
        let mut out = Array2::zeros((data.nrows(), width));
        for (src, mut dst) in data.rows().into_iter().zip(out.rows_mut()) {
            for (k, term) in self.terms.iter().enumerate() {
                dst[k] = term.iter().map(|&j| src[j]).product();
            }
        }
        Ok(out)
    }
}
